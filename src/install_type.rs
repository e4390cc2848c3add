use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

/// How the application was installed.
///
/// The consumer can be restricted to a subset of install types, e.g. to only send analytics from
/// production builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InstallType {
    /// Installed from the public store.
    Production,
    /// Installed from an internal beta channel.
    TestFlight,
    /// Built and installed locally by a developer.
    Development,
    /// Running inside a simulator or emulator.
    Simulator,
}

impl InstallType {
    /// Every install type. This is the default set of enabled install types.
    pub const ALL: [InstallType; 4] = [
        InstallType::Production,
        InstallType::TestFlight,
        InstallType::Development,
        InstallType::Simulator,
    ];

    /// Camel-case name, matching the serialized representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            InstallType::Production => "production",
            InstallType::TestFlight => "testFlight",
            InstallType::Development => "development",
            InstallType::Simulator => "simulator",
        }
    }
}

impl fmt::Display for InstallType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InstallType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        InstallType::ALL
            .into_iter()
            .find(|install_type| install_type.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::UnknownInstallType(s.to_owned()))
    }
}

impl log::kv::ToValue for InstallType {
    fn to_value(&self) -> log::kv::Value {
        log::kv::Value::from_display(self)
    }
}

#[cfg(test)]
mod tests {
    use super::InstallType;
    use crate::Error;

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!("testFlight".parse::<InstallType>().unwrap(), InstallType::TestFlight);
        assert_eq!("TESTFLIGHT".parse::<InstallType>().unwrap(), InstallType::TestFlight);
        assert_eq!(" production ".parse::<InstallType>().unwrap(), InstallType::Production);
    }

    #[test]
    fn rejects_unknown_names() {
        assert!(matches!(
            "beta".parse::<InstallType>(),
            Err(Error::UnknownInstallType(name)) if name == "beta"
        ));
    }

    #[test]
    fn serializes_as_camel_case() {
        assert_eq!(
            serde_json::to_string(&InstallType::TestFlight).unwrap(),
            "\"testFlight\""
        );
    }
}
