use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::{America, Australia, OffsetComponents, Tz};

/// Which name a [`ZoneMatcher`] looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameSubject {
    TapeName,
    /// File name without directory or extension.
    FileName,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameMatch {
    Prefix,
    Contains,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneMatcher {
    pub subject: NameSubject,
    pub kind: NameMatch,
    pub pattern: String,
}

impl ZoneMatcher {
    pub fn new(subject: NameSubject, kind: NameMatch, pattern: impl Into<String>) -> Self {
        Self {
            subject,
            kind,
            pattern: pattern.into(),
        }
    }

    pub fn matches(&self, tape_name: Option<&str>, file_name: &str) -> bool {
        let candidate = match self.subject {
            NameSubject::TapeName => match tape_name {
                Some(tape) => tape,
                None => return false,
            },
            NameSubject::FileName => file_name,
        };
        match self.kind {
            NameMatch::Prefix => candidate.starts_with(&self.pattern),
            NameMatch::Contains => candidate.contains(&self.pattern),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ZoneRule {
    pub matchers: Vec<ZoneMatcher>,
    pub zone: Tz,
}

impl ZoneRule {
    pub fn new(matchers: Vec<ZoneMatcher>, zone: Tz) -> Self {
        Self { matchers, zone }
    }

    fn applies(&self, tape_name: Option<&str>, file_name: &str) -> bool {
        self.matchers
            .iter()
            .any(|matcher| matcher.matches(tape_name, file_name))
    }
}

/// Ordered zone rules evaluated first-match-wins, with a fallback zone.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneTable {
    rules: Vec<ZoneRule>,
    fallback: Tz,
}

impl ZoneTable {
    pub fn new(rules: Vec<ZoneRule>, fallback: Tz) -> Self {
        Self { rules, fallback }
    }

    /// Regions the capture archive was recorded in; unmatched tapes are Adelaide.
    pub fn capture_regions() -> Self {
        use NameMatch::{Contains, Prefix};
        use NameSubject::{FileName, TapeName};

        Self::new(
            vec![
                ZoneRule::new(
                    vec![
                        ZoneMatcher::new(TapeName, Prefix, "CAN"),
                        ZoneMatcher::new(FileName, Prefix, "CAN"),
                    ],
                    America::Vancouver,
                ),
                ZoneRule::new(
                    vec![
                        ZoneMatcher::new(TapeName, Prefix, "USA"),
                        ZoneMatcher::new(FileName, Prefix, "USA"),
                    ],
                    America::New_York,
                ),
                ZoneRule::new(
                    vec![ZoneMatcher::new(FileName, Contains, "Perth")],
                    Australia::Perth,
                ),
                ZoneRule::new(
                    vec![ZoneMatcher::new(TapeName, Contains, "VIC")],
                    Australia::Sydney,
                ),
                ZoneRule::new(
                    vec![ZoneMatcher::new(TapeName, Contains, "DUNK")],
                    Australia::Brisbane,
                ),
            ],
            Australia::Adelaide,
        )
    }

    pub fn rules(&self) -> &[ZoneRule] {
        &self.rules
    }

    pub fn fallback(&self) -> Tz {
        self.fallback
    }

    pub fn zone_for(&self, tape_name: Option<&str>, file_name: &str) -> Tz {
        self.rules
            .iter()
            .find(|rule| rule.applies(tape_name, file_name))
            .map(|rule| rule.zone)
            .unwrap_or(self.fallback)
    }

    /// Interprets a camcorder wall-clock reading in the zone selected for the
    /// tape/file. A reading inside a DST fold or gap is taken at the zone's
    /// standard offset, so a fold resolves to its later instant.
    pub fn to_utc(
        &self,
        local: NaiveDateTime,
        tape_name: Option<&str>,
        file_name: &str,
    ) -> Option<DateTime<Utc>> {
        let zone = self.zone_for(tape_name, file_name);
        if let Some(resolved) = zone.from_local_datetime(&local).single() {
            return Some(resolved.with_timezone(&Utc));
        }
        let standard = zone.offset_from_utc_datetime(&local).base_utc_offset();
        local
            .checked_sub_signed(standard)
            .map(|instant| instant.and_utc())
    }
}

impl Default for ZoneTable {
    fn default() -> Self {
        Self::capture_regions()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn local(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|date| date.and_hms_opt(h, min, 0))
            .expect("valid date")
    }

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.from_utc_datetime(&local(y, m, d, h, min))
    }

    #[test]
    fn tape_prefixes_select_north_american_zones() {
        let table = ZoneTable::capture_regions();
        assert_eq!(table.zone_for(Some("CAN03"), "clip"), America::Vancouver);
        assert_eq!(table.zone_for(None, "CAN trip 01"), America::Vancouver);
        assert_eq!(table.zone_for(Some("USA1"), "clip"), America::New_York);
        assert_eq!(table.zone_for(Some("XCAN"), "clip"), Australia::Adelaide);
    }

    #[test]
    fn substring_rules_and_fallback() {
        let table = ZoneTable::capture_regions();
        assert_eq!(table.zone_for(Some("WA01"), "Perth beach"), Australia::Perth);
        assert_eq!(table.zone_for(Some("VIC001"), "clip"), Australia::Sydney);
        assert_eq!(table.zone_for(Some("XDUNKX"), "clip"), Australia::Brisbane);
        assert_eq!(table.zone_for(Some("SA01"), "clip"), Australia::Adelaide);
        assert_eq!(table.zone_for(None, "clip"), Australia::Adelaide);
    }

    #[test]
    fn first_matching_rule_wins() {
        let table = ZoneTable::capture_regions();
        assert_eq!(table.zone_for(Some("USAVIC"), "Perth"), America::New_York);
        assert_eq!(table.zone_for(Some("VIC"), "Perth"), Australia::Perth);
    }

    #[test]
    fn converts_daylight_saving_local_time_to_utc() {
        let table = ZoneTable::capture_regions();
        assert_eq!(
            table.to_utc(local(2020, 1, 2, 10, 0), Some("VIC001"), "clip"),
            Some(utc(2020, 1, 1, 23, 0))
        );
        assert_eq!(
            table.to_utc(local(2020, 7, 2, 10, 0), Some("VIC001"), "clip"),
            Some(utc(2020, 7, 2, 0, 0))
        );
        assert_eq!(
            table.to_utc(local(2020, 1, 2, 10, 0), Some("SA01"), "clip"),
            Some(utc(2020, 1, 1, 23, 30))
        );
    }

    #[test]
    fn ambiguous_reading_uses_standard_offset() {
        let table = ZoneTable::capture_regions();
        // Sydney falls back from +11 to +10 at 03:00 on 2020-04-05.
        assert_eq!(
            table.to_utc(local(2020, 4, 5, 2, 30), Some("VIC"), "clip"),
            Some(utc(2020, 4, 4, 16, 30))
        );
    }

    #[test]
    fn skipped_reading_uses_standard_offset() {
        let table = ZoneTable::capture_regions();
        // Sydney springs forward from 02:00 to 03:00 on 2020-10-04.
        assert_eq!(
            table.to_utc(local(2020, 10, 4, 2, 30), Some("VIC"), "clip"),
            Some(utc(2020, 10, 3, 16, 30))
        );
    }
}
