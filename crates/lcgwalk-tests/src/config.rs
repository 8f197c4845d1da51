//! Test selection: which tests run and with how many intervals.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use lcgwalk_core::{Error, Result};

/// The fixed set of six tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestKind {
    Means,
    Variance,
    ChiSquare,
    KolmogorovSmirnov,
    Poker,
    Runs,
}

impl TestKind {
    pub const ALL: [TestKind; 6] = [
        TestKind::Means,
        TestKind::Variance,
        TestKind::ChiSquare,
        TestKind::KolmogorovSmirnov,
        TestKind::Poker,
        TestKind::Runs,
    ];

    /// Canonical identifier used in configs and JSON keys.
    pub fn id(self) -> &'static str {
        match self {
            TestKind::Means => "means",
            TestKind::Variance => "variance",
            TestKind::ChiSquare => "chi_square",
            TestKind::KolmogorovSmirnov => "kolmogorov_smirnov",
            TestKind::Poker => "poker",
            TestKind::Runs => "runs",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            TestKind::Means => "Means Test",
            TestKind::Variance => "Variance Test",
            TestKind::ChiSquare => "Chi-Square Uniformity Test",
            TestKind::KolmogorovSmirnov => "Kolmogorov-Smirnov Test",
            TestKind::Poker => "Poker Test",
            TestKind::Runs => "Runs Up/Down Test",
        }
    }

    /// Whether the test needs an interval count `k`.
    pub fn requires_bins(self) -> bool {
        matches!(self, TestKind::ChiSquare | TestKind::KolmogorovSmirnov)
    }
}

impl fmt::Display for TestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for TestKind {
    type Err = Error;

    /// Parse a canonical identifier or one of the legacy aliases
    /// (`medias`, `varianza`, `chi`, `kolmogorov`, `ks`, `rachas`).
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "means" | "medias" => Ok(TestKind::Means),
            "variance" | "varianza" => Ok(TestKind::Variance),
            "chi_square" | "chi2" | "chi" => Ok(TestKind::ChiSquare),
            "kolmogorov_smirnov" | "kolmogorov" | "ks" => Ok(TestKind::KolmogorovSmirnov),
            "poker" => Ok(TestKind::Poker),
            "runs" | "rachas" => Ok(TestKind::Runs),
            _ => Err(Error::UnknownTest(s.to_string())),
        }
    }
}

/// Per-test enablement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TestSetting {
    #[default]
    Disabled,
    Enabled,
    EnabledWithBins(usize),
}

impl TestSetting {
    pub fn is_enabled(self) -> bool {
        !matches!(self, TestSetting::Disabled)
    }

    pub fn bins(self) -> Option<usize> {
        match self {
            TestSetting::EnabledWithBins(k) => Some(k),
            _ => None,
        }
    }

    fn to_json_value(self) -> Value {
        match self {
            TestSetting::Disabled => Value::Bool(false),
            TestSetting::Enabled => Value::Bool(true),
            TestSetting::EnabledWithBins(k) => serde_json::json!({ "k": k }),
        }
    }

    fn from_json_value(kind: TestKind, value: &Value) -> Result<Self> {
        match value {
            Value::Null | Value::Bool(false) => Ok(TestSetting::Disabled),
            Value::Bool(true) => Ok(TestSetting::Enabled),
            Value::Object(obj) => match obj.get("k") {
                None | Some(Value::Null) => Ok(TestSetting::Enabled),
                Some(k) => k
                    .as_u64()
                    .map(|k| TestSetting::EnabledWithBins(k as usize))
                    .ok_or_else(|| {
                        Error::invalid(format!("{kind}: k must be a non-negative integer, got {k}"))
                    }),
            },
            other => Err(Error::invalid(format!(
                "{kind}: expected true, false or {{\"k\": N}}, got {other}"
            ))),
        }
    }
}

/// Which tests to run. Unlisted tests are disabled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestConfig {
    entries: BTreeMap<TestKind, TestSetting>,
}

impl TestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every test enabled, with `bins` intervals for the uniformity tests.
    pub fn all(bins: usize) -> Self {
        TestKind::ALL.iter().fold(Self::new(), |cfg, &kind| {
            let setting = if kind.requires_bins() {
                TestSetting::EnabledWithBins(bins)
            } else {
                TestSetting::Enabled
            };
            cfg.with(kind, setting)
        })
    }

    pub fn with(mut self, kind: TestKind, setting: TestSetting) -> Self {
        self.set(kind, setting);
        self
    }

    pub fn set(&mut self, kind: TestKind, setting: TestSetting) {
        self.entries.insert(kind, setting);
    }

    pub fn get(&self, kind: TestKind) -> TestSetting {
        self.entries.get(&kind).copied().unwrap_or_default()
    }

    /// Entries in test order, including disabled ones.
    pub fn iter(&self) -> impl Iterator<Item = (TestKind, TestSetting)> + '_ {
        self.entries.iter().map(|(&k, &s)| (k, s))
    }

    pub fn enabled(&self) -> impl Iterator<Item = (TestKind, TestSetting)> + '_ {
        self.iter().filter(|(_, s)| s.is_enabled())
    }

    pub fn enabled_count(&self) -> usize {
        self.enabled().count()
    }

    /// Parse the object form `{"means": true, "chi": {"k": 10}, "poker": false}`.
    pub fn from_json(s: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(s)
            .map_err(|e| Error::invalid(format!("test config is not valid JSON: {e}")))?;
        Self::from_json_value(&value)
    }

    pub fn from_json_value(value: &Value) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| Error::invalid("test config must be a JSON object"))?;
        let mut config = Self::new();
        for (name, setting) in obj {
            let kind: TestKind = name.parse()?;
            config.insert_once(kind, TestSetting::from_json_value(kind, setting)?)?;
        }
        Ok(config)
    }

    /// Add a setting, failing if an alias already configured the same test.
    fn insert_once(&mut self, kind: TestKind, setting: TestSetting) -> Result<()> {
        if self.entries.contains_key(&kind) {
            return Err(Error::invalid(format!("{kind} configured more than once")));
        }
        self.entries.insert(kind, setting);
        Ok(())
    }

    pub fn to_json_value(&self) -> Value {
        let map: Map<String, Value> = self
            .iter()
            .map(|(kind, setting)| (kind.id().to_string(), setting.to_json_value()))
            .collect();
        Value::Object(map)
    }

    /// Parse a comma-separated list such as `means,chi_square=10,ks=10`.
    /// `all` enables every test that does not need intervals and was not
    /// named explicitly. Naming one test twice is an error.
    pub fn parse_list(s: &str) -> Result<Self> {
        let mut config = Self::new();
        let mut all = false;
        for item in s.split(',').map(str::trim).filter(|i| !i.is_empty()) {
            if item.eq_ignore_ascii_case("all") {
                all = true;
                continue;
            }
            let (name, bins) = match item.split_once(|c: char| c == '=' || c == ':') {
                Some((name, bins)) => (name, Some(bins.trim())),
                None => (item, None),
            };
            let kind: TestKind = name.parse()?;
            let setting = match bins {
                Some(b) => TestSetting::EnabledWithBins(b.parse().map_err(|_| {
                    Error::invalid(format!("{kind}: interval count '{b}' is not an integer"))
                })?),
                None => TestSetting::Enabled,
            };
            config.insert_once(kind, setting)?;
        }
        if all {
            for kind in TestKind::ALL.iter().filter(|k| !k.requires_bins()) {
                config.entries.entry(*kind).or_insert(TestSetting::Enabled);
            }
        }
        Ok(config)
    }
}

impl Serialize for TestConfig {
    fn serialize<S: Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json_value().serialize(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_canonical_ids_and_aliases() {
        for kind in TestKind::ALL {
            assert_eq!(kind.id().parse::<TestKind>().unwrap(), kind);
        }
        assert_eq!("medias".parse::<TestKind>().unwrap(), TestKind::Means);
        assert_eq!("CHI".parse::<TestKind>().unwrap(), TestKind::ChiSquare);
        assert_eq!(
            "kolmogorov".parse::<TestKind>().unwrap(),
            TestKind::KolmogorovSmirnov
        );
        assert_eq!("rachas".parse::<TestKind>().unwrap(), TestKind::Runs);
    }

    #[test]
    fn unknown_identifier_is_rejected() {
        assert_eq!(
            "serial".parse::<TestKind>(),
            Err(Error::UnknownTest("serial".into()))
        );
    }

    #[test]
    fn legacy_json_config() {
        let cfg = TestConfig::from_json(
            r#"{"medias": true, "varianza": false, "chi": {"k": 10},
                "kolmogorov": {"k": 5}, "poker": null, "rachas": true}"#,
        )
        .unwrap();
        assert_eq!(cfg.get(TestKind::Means), TestSetting::Enabled);
        assert_eq!(cfg.get(TestKind::Variance), TestSetting::Disabled);
        assert_eq!(cfg.get(TestKind::ChiSquare), TestSetting::EnabledWithBins(10));
        assert_eq!(
            cfg.get(TestKind::KolmogorovSmirnov),
            TestSetting::EnabledWithBins(5)
        );
        assert_eq!(cfg.get(TestKind::Poker), TestSetting::Disabled);
        assert_eq!(cfg.enabled_count(), 4);
    }

    #[test]
    fn json_config_errors() {
        assert!(matches!(
            TestConfig::from_json(r#"{"serial": true}"#),
            Err(Error::UnknownTest(_))
        ));
        assert!(matches!(
            TestConfig::from_json(r#"{"chi": {"k": "ten"}}"#),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            TestConfig::from_json(r#"{"means": "yes"}"#),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            TestConfig::from_json("[1, 2]"),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn aliases_of_one_test_conflict() {
        for raw in [
            r#"{"chi": {"k": 10}, "chi_square": false}"#,
            r#"{"means": true, "medias": true}"#,
            r#"{"ks": {"k": 4}, "kolmogorov": {"k": 4}}"#,
        ] {
            assert!(
                matches!(TestConfig::from_json(raw), Err(Error::InvalidParameter(_))),
                "{raw}"
            );
        }
        assert!(matches!(
            TestConfig::parse_list("chi=10,chi_square"),
            Err(Error::InvalidParameter(_))
        ));
        assert!(TestConfig::parse_list("runs,rachas").is_err());
    }

    #[test]
    fn all_leaves_explicit_entries_alone() {
        let cfg = TestConfig::parse_list("all,chi=10").unwrap();
        assert_eq!(cfg.enabled_count(), 5);
        assert_eq!(cfg.get(TestKind::ChiSquare), TestSetting::EnabledWithBins(10));

        let cfg = TestConfig::parse_list("means,all").unwrap();
        assert_eq!(cfg.enabled_count(), 4);
    }

    #[test]
    fn object_without_k_is_plain_enabled() {
        let cfg = TestConfig::from_json(r#"{"chi": {}}"#).unwrap();
        assert_eq!(cfg.get(TestKind::ChiSquare), TestSetting::Enabled);
    }

    #[test]
    fn json_round_trip_uses_canonical_ids() {
        let cfg = TestConfig::all(8).with(TestKind::Poker, TestSetting::Disabled);
        let value = cfg.to_json_value();
        assert_eq!(value["chi_square"]["k"], 8);
        assert_eq!(value["poker"], false);
        assert_eq!(value["runs"], true);
        assert_eq!(TestConfig::from_json_value(&value).unwrap(), cfg);
    }

    #[test]
    fn list_syntax() {
        let cfg = TestConfig::parse_list("means, chi=10 ,ks:4,runs").unwrap();
        assert_eq!(cfg.get(TestKind::Means), TestSetting::Enabled);
        assert_eq!(cfg.get(TestKind::ChiSquare), TestSetting::EnabledWithBins(10));
        assert_eq!(
            cfg.get(TestKind::KolmogorovSmirnov),
            TestSetting::EnabledWithBins(4)
        );
        assert_eq!(cfg.get(TestKind::Poker), TestSetting::Disabled);

        let all = TestConfig::parse_list("all").unwrap();
        assert_eq!(all.enabled_count(), 4);
        assert!(TestConfig::parse_list("chi=x").is_err());
        assert!(TestConfig::parse_list("means,bogus").is_err());
    }
}
