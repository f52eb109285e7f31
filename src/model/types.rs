use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// DigitalOcean regions that offer managed Kubernetes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    Nyc1,
    Nyc3,
    Sfo2,
    Sfo3,
    Ams3,
    Sgp1,
    Lon1,
    Fra1,
    Tor1,
    Blr1,
    Syd1,
}

impl Region {
    pub const ALL: [Region; 11] = [
        Region::Nyc1,
        Region::Nyc3,
        Region::Sfo2,
        Region::Sfo3,
        Region::Ams3,
        Region::Sgp1,
        Region::Lon1,
        Region::Fra1,
        Region::Tor1,
        Region::Blr1,
        Region::Syd1,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            Region::Nyc1 => "nyc1",
            Region::Nyc3 => "nyc3",
            Region::Sfo2 => "sfo2",
            Region::Sfo3 => "sfo3",
            Region::Ams3 => "ams3",
            Region::Sgp1 => "sgp1",
            Region::Lon1 => "lon1",
            Region::Fra1 => "fra1",
            Region::Tor1 => "tor1",
            Region::Blr1 => "blr1",
            Region::Syd1 => "syd1",
        }
    }

    /// Look up a region by its exact slug
    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.slug() == slug)
    }

    /// Comma separated list of supported slugs, for error suggestions
    pub fn supported_list() -> String {
        Self::ALL
            .iter()
            .map(|r| r.slug())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// Day of week for the control plane maintenance window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Weekday::Monday => "monday",
            Weekday::Tuesday => "tuesday",
            Weekday::Wednesday => "wednesday",
            Weekday::Thursday => "thursday",
            Weekday::Friday => "friday",
            Weekday::Saturday => "saturday",
            Weekday::Sunday => "sunday",
        }
    }

    /// Parse a full weekday name, ignoring case. Abbreviations are rejected.
    pub fn from_name(name: &str) -> Option<Self> {
        let lowered = name.trim().to_lowercase();
        Self::ALL.into_iter().find(|d| d.name() == lowered)
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Kubernetes taint effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum TaintEffect {
    NoSchedule,
    PreferNoSchedule,
    NoExecute,
}

impl TaintEffect {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "NoSchedule" => Some(TaintEffect::NoSchedule),
            "PreferNoSchedule" => Some(TaintEffect::PreferNoSchedule),
            "NoExecute" => Some(TaintEffect::NoExecute),
            _ => None,
        }
    }
}

/// Container registry subscription tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistryTier {
    Starter,
    Basic,
    Professional,
}

impl RegistryTier {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "starter" => Some(RegistryTier::Starter),
            "basic" => Some(RegistryTier::Basic),
            "professional" => Some(RegistryTier::Professional),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RegistryTier::Starter => "starter",
            RegistryTier::Basic => "basic",
            RegistryTier::Professional => "professional",
        }
    }
}

impl fmt::Display for RegistryTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Environment label applied to the project and to common tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Environment {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "development" => Some(Environment::Development),
            "staging" => Some(Environment::Staging),
            "production" => Some(Environment::Production),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Firewall rule protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
    Icmp,
}

impl Protocol {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "tcp" => Some(Protocol::Tcp),
            "udp" => Some(Protocol::Udp),
            "icmp" => Some(Protocol::Icmp),
            _ => None,
        }
    }
}

/// Port selection for a firewall rule: `all`, a single port, or `low-high`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub enum PortRange {
    All,
    Single(u16),
    Range(u16, u16),
}

impl FromStr for PortRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") || s == "1-65535" {
            return Ok(PortRange::All);
        }

        let parse_port = |p: &str| -> Result<u16, String> {
            match p.trim().parse::<u16>() {
                Ok(0) | Err(_) => Err(format!("'{}' is not a port between 1 and 65535", p)),
                Ok(port) => Ok(port),
            }
        };

        match s.split_once('-') {
            Some((low, high)) => {
                let (low, high) = (parse_port(low)?, parse_port(high)?);
                if low > high {
                    return Err(format!("range start {} is after range end {}", low, high));
                }
                if low == high {
                    Ok(PortRange::Single(low))
                } else {
                    Ok(PortRange::Range(low, high))
                }
            }
            None => parse_port(s).map(PortRange::Single),
        }
    }
}

impl TryFrom<String> for PortRange {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PortRange> for String {
    fn from(value: PortRange) -> Self {
        value.to_string()
    }
}

impl fmt::Display for PortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortRange::All => f.write_str("all"),
            PortRange::Single(port) => write!(f, "{}", port),
            PortRange::Range(low, high) => write!(f, "{}-{}", low, high),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_slug_round_trip() {
        for region in Region::ALL {
            assert_eq!(Region::from_slug(region.slug()), Some(region));
        }
        assert_eq!(Region::from_slug("NYC3"), None);
        assert_eq!(Region::from_slug("mars1"), None);
    }

    #[test]
    fn test_weekday_case_insensitive() {
        assert_eq!(Weekday::from_name("Monday"), Some(Weekday::Monday));
        assert_eq!(Weekday::from_name("SUNDAY"), Some(Weekday::Sunday));
        assert_eq!(Weekday::from_name("mon"), None);
        assert_eq!(Weekday::from_name("any"), None);
    }

    #[test]
    fn test_taint_effect_is_exact() {
        assert_eq!(
            TaintEffect::from_name("PreferNoSchedule"),
            Some(TaintEffect::PreferNoSchedule)
        );
        assert_eq!(TaintEffect::from_name("noschedule"), None);
    }

    #[test]
    fn test_port_range_parsing() {
        assert_eq!("all".parse::<PortRange>(), Ok(PortRange::All));
        assert_eq!("443".parse::<PortRange>(), Ok(PortRange::Single(443)));
        assert_eq!(
            "8000-9000".parse::<PortRange>(),
            Ok(PortRange::Range(8000, 9000))
        );
        assert_eq!("80-80".parse::<PortRange>(), Ok(PortRange::Single(80)));
        assert!("0".parse::<PortRange>().is_err());
        assert!("9000-8000".parse::<PortRange>().is_err());
        assert!("70000".parse::<PortRange>().is_err());
        assert!("http".parse::<PortRange>().is_err());
    }

    #[test]
    fn test_port_range_serializes_as_string() {
        let json = serde_json::to_string(&PortRange::Range(30000, 32767)).unwrap();
        assert_eq!(json, "\"30000-32767\"");
        let parsed: PortRange = serde_json::from_str("\"22\"").unwrap();
        assert_eq!(parsed, PortRange::Single(22));
    }
}
