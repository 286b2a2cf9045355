//! Flavor descriptor

use serde::{Deserialize, Serialize};

/// One buildable variant of a worker, read from a `*.json` descriptor.
///
/// ```json
/// {
///   "name": "DNS_Lookup",
///   "version": "1.0",
///   "description": "Resolve a domain name",
///   "command": "dns.py"
/// }
/// ```
///
/// Unknown keys are ignored so descriptors may carry extra metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flavor {
    pub name: String,
    pub version: String,
    pub description: String,
    pub command: String,
}

impl Flavor {
    /// Image repository name derived from the flavor name.
    pub fn repo(&self) -> String {
        self.name.to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_is_lowercased_name() {
        let flavor = Flavor {
            name: "DNS_Lookup".to_string(),
            version: "1.0".to_string(),
            description: String::new(),
            command: "dns.py".to_string(),
        };
        assert_eq!(flavor.repo(), "dns_lookup");
        assert_eq!(flavor.name, "DNS_Lookup");
    }

    #[test]
    fn test_deserialize_ignores_extra_keys() {
        let json = r#"{
            "name": "Whois",
            "version": "2.5",
            "description": "whois lookup",
            "command": "whois.py",
            "author": "someone",
            "configurationItems": []
        }"#;
        let flavor: Flavor = serde_json::from_str(json).unwrap();
        assert_eq!(flavor.version, "2.5");
        assert_eq!(flavor.command, "whois.py");
    }

    #[test]
    fn test_deserialize_requires_all_fields() {
        let json = r#"{ "name": "Whois", "version": "2.5", "command": "whois.py" }"#;
        let err = serde_json::from_str::<Flavor>(json).unwrap_err();
        assert!(err.to_string().contains("description"));
    }
}
