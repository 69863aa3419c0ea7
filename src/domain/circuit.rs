// src/domain/circuit.rs
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Circuit {
    #[serde(default)]
    pub circuit_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
    #[serde(default)]
    pub circuit_name: String,
    #[serde(
        rename = "Location",
        alias = "location",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub location: Option<Location>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub lat: String,
    #[serde(default)]
    pub long: String,
    #[serde(default)]
    pub locality: String,
    #[serde(default)]
    pub country: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lowercase_location_is_accepted() {
        let circuit: Circuit = serde_json::from_value(json!({
            "circuitId": "monza",
            "circuitName": "Autodromo Nazionale di Monza",
            "location": { "lat": "45.6156", "long": "9.28111", "locality": "Monza", "country": "Italy" }
        }))
        .unwrap();

        assert_eq!(circuit.location.as_ref().unwrap().locality, "Monza");

        let out = serde_json::to_value(&circuit).unwrap();
        assert!(out.get("Location").is_some());
        assert!(out.get("location").is_none());
        assert!(out.get("url").is_none());
    }
}
