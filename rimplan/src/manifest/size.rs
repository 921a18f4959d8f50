// SPDX-License-Identifier: MIT

use rimslice::{BLOCKS_PER_MB, SliceSize, SliceTag};
use serde::{Deserialize, Deserializer};

use crate::manifest::error::ManifestError;

/// Slice size as written in a manifest: `"max"`, `"512M"`, `"2G"`, `"128K"`
/// or a plain sector count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeSpec(pub SliceSize);

impl<'de> Deserialize<'de> for SizeSpec {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct SizeVisitor;

        impl<'de> serde::de::Visitor<'de> for SizeVisitor {
            type Value = SizeSpec;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a sector count or a size string like '512M', '1G', '128K' or 'max'")
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(SizeSpec(SliceSize::Sectors(value)))
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                u64::try_from(value)
                    .map(|n| SizeSpec(SliceSize::Sectors(n)))
                    .map_err(|_| E::custom(format!("negative slice size {value}")))
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                parse_slice_size(value).map(SizeSpec).map_err(E::custom)
            }
        }

        deserializer.deserialize_any(SizeVisitor)
    }
}

impl std::fmt::Display for SizeSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Swap size in MiB, written like `"512M"` or `"1G"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SwapSize(pub u64);

impl<'de> Deserialize<'de> for SwapSize {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse_size_mb(&raw)
            .map(SwapSize)
            .map_err(serde::de::Error::custom)
    }
}

/// Slice tag by name (`"root"`, `"swap"`, ...) or raw VTOC code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TagSpec(pub SliceTag);

impl<'de> Deserialize<'de> for TagSpec {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct TagVisitor;

        impl<'de> serde::de::Visitor<'de> for TagVisitor {
            type Value = TagSpec;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a tag name like 'root' or 'swap', or a VTOC tag code")
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                u16::try_from(value)
                    .map(|code| TagSpec(SliceTag::from_raw(code)))
                    .map_err(|_| E::custom(format!("tag code {value} out of range")))
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                u16::try_from(value)
                    .map(|code| TagSpec(SliceTag::from_raw(code)))
                    .map_err(|_| E::custom(format!("tag code {value} out of range")))
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                SliceTag::from_name(value.trim())
                    .map(TagSpec)
                    .ok_or_else(|| E::custom(ManifestError::UnknownTag(value.into())))
            }
        }

        deserializer.deserialize_any(TagVisitor)
    }
}

fn parse_number(num: &str, original: &str) -> Result<u64, ManifestError> {
    num.trim()
        .parse::<u64>()
        .map_err(|_| ManifestError::InvalidSize(original.into()))
}

/// Parses a size string into MiB.
pub fn parse_size_mb(size: &str) -> Result<u64, ManifestError> {
    let lower = size.trim().to_lowercase();

    if let Some(num) = lower.strip_suffix("k") {
        let kb = parse_number(num, size)?;
        Ok(kb.div_ceil(1024))
    } else if let Some(num) = lower.strip_suffix("m") {
        parse_number(num, size)
    } else if let Some(num) = lower.strip_suffix("g") {
        Ok(parse_number(num, size)?.saturating_mul(1024))
    } else {
        Err(ManifestError::InvalidSize(size.into()))
    }
}

/// Parses a slice size into sectors, or [`SliceSize::Max`].
pub fn parse_slice_size(size: &str) -> Result<SliceSize, ManifestError> {
    let lower = size.trim().to_lowercase();

    if lower == "max" {
        return Ok(SliceSize::Max);
    }
    if let Some(num) = lower.strip_suffix("k") {
        // 2 sectors per KiB
        return Ok(SliceSize::Sectors(parse_number(num, size)?.saturating_mul(2)));
    }
    if let Some(num) = lower.strip_suffix("m") {
        return Ok(SliceSize::from_mb(parse_number(num, size)?));
    }
    if let Some(num) = lower.strip_suffix("g") {
        let mb = parse_number(num, size)?.saturating_mul(1024);
        return Ok(SliceSize::Sectors(mb.saturating_mul(BLOCKS_PER_MB)));
    }
    parse_number(&lower, size).map(SliceSize::Sectors)
}
