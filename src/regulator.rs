//! Static supply registry for the sensor's power rails.

/// One voltage-rail descriptor the platform must provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegulatorDescriptor {
    pub name: &'static str,
    pub vmin_uv: u32,
    pub vmax_uv: u32,
    pub load_ua: u32,
}

/// Default GF3208 supply table.
pub static SUPPLIES: [RegulatorDescriptor; 3] = [
    RegulatorDescriptor {
        name: "vdd_ana",
        vmin_uv: 1_800_000,
        vmax_uv: 1_800_000,
        load_ua: 6_000,
    },
    RegulatorDescriptor {
        name: "vcc_spi",
        vmin_uv: 1_800_000,
        vmax_uv: 1_800_000,
        load_ua: 10,
    },
    RegulatorDescriptor {
        name: "vdd_io",
        vmin_uv: 1_800_000,
        vmax_uv: 1_800_000,
        load_ua: 6_000,
    },
];

/// Index of the first entry whose name is a prefix of `name`.
pub(crate) fn lookup(table: &[RegulatorDescriptor], name: &str) -> Option<usize> {
    table.iter().position(|desc| name.starts_with(desc.name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_name_matches() {
        assert_eq!(lookup(&SUPPLIES, "vdd_ana"), Some(0));
        assert_eq!(lookup(&SUPPLIES, "vcc_spi"), Some(1));
        assert_eq!(lookup(&SUPPLIES, "vdd_io"), Some(2));
    }

    #[test]
    fn entry_name_prefixes_requested_name() {
        // a suffixed supply name still resolves to its table entry
        assert_eq!(lookup(&SUPPLIES, "vdd_io_2"), Some(2));
        // but a shorter request does not match a longer entry
        assert_eq!(lookup(&SUPPLIES, "vdd"), None);
    }

    #[test]
    fn unknown_name_matches_nothing() {
        assert_eq!(lookup(&SUPPLIES, "vbat"), None);
    }

    #[test]
    fn first_match_wins() {
        static AMBIGUOUS: [RegulatorDescriptor; 2] = [
            RegulatorDescriptor {
                name: "vdd",
                vmin_uv: 1_800_000,
                vmax_uv: 1_800_000,
                load_ua: 100,
            },
            RegulatorDescriptor {
                name: "vdd_io",
                vmin_uv: 1_800_000,
                vmax_uv: 1_800_000,
                load_ua: 100,
            },
        ];
        assert_eq!(lookup(&AMBIGUOUS, "vdd_io"), Some(0));
    }
}
