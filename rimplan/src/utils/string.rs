// SPDX-License-Identifier: MIT

pub use rimslice::utils::sep_u64;

pub const SECTOR_SIZE: u64 = 512;

/// Byte count in binary units ("1.5 MiB").
pub fn pretty_bytes(n: u64) -> String {
    const UNITS: [&str; 7] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB", "EiB"];
    if n < 1024 {
        return format!("{} {}", sep_u64(n), UNITS[0]);
    }
    let mut val = n as f64;
    let mut unit = 0;
    while val >= 1024.0 && unit + 1 < UNITS.len() {
        val /= 1024.0;
        unit += 1;
    }
    format!("{val:.1} {}", UNITS[unit])
}

/// Sector count as a human readable byte size.
pub fn pretty_sectors(sectors: u64) -> String {
    pretty_bytes(sectors.saturating_mul(SECTOR_SIZE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_below_one_kib_stay_exact() {
        assert_eq!(pretty_bytes(0), "0 B");
        assert_eq!(pretty_bytes(1023), "1 023 B");
        assert_eq!(pretty_bytes(1536), "1.5 KiB");
    }

    #[test]
    fn sectors_to_bytes() {
        assert_eq!(pretty_sectors(1), "512 B");
        assert_eq!(pretty_sectors(2048), "1.0 MiB");
        assert_eq!(pretty_sectors(3 * 1024 * 2048), "3.0 GiB");
    }
}
