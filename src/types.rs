use geo::MultiPolygon;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One county row of the attribute table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EducationRecord {
    pub fips: u32,
    pub state: String,
    pub area_name: String,
    #[serde(rename = "bachelorsOrHigher")]
    pub bachelors_or_higher: f64,
}

/// A county boundary decoded from the topology.
#[derive(Debug, Clone)]
pub struct TopologyFeature {
    pub id: Option<u32>,
    pub geometry: MultiPolygon<f64>,
}

/// Records keyed by FIPS code, built once after load.
#[derive(Debug, Clone, Default)]
pub struct EducationIndex {
    records: HashMap<u32, EducationRecord>,
}

impl EducationIndex {
    pub fn new(records: Vec<EducationRecord>) -> Self {
        let mut map = HashMap::with_capacity(records.len());
        for record in records {
            // First occurrence wins, same as a find() over the array
            map.entry(record.fips).or_insert(record);
        }
        Self { records: map }
    }

    pub fn get(&self, fips: u32) -> Option<&EducationRecord> {
        self.records.get(&fips)
    }

    /// Lookup for a feature id, `None` when the feature has no id.
    pub fn lookup(&self, id: Option<u32>) -> Option<&EducationRecord> {
        id.and_then(|fips| self.get(fips))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(fips: u32, name: &str, value: f64) -> EducationRecord {
        EducationRecord {
            fips,
            state: "AL".to_string(),
            area_name: name.to_string(),
            bachelors_or_higher: value,
        }
    }

    #[test]
    fn deserializes_wire_names() {
        let json = r#"{"fips":1001,"state":"AL","area_name":"Autauga County","bachelorsOrHigher":21.9}"#;
        let rec: EducationRecord = serde_json::from_str(json).unwrap();
        assert_eq!(rec.fips, 1001);
        assert_eq!(rec.area_name, "Autauga County");
        assert_eq!(rec.bachelors_or_higher, 21.9);
    }

    #[test]
    fn index_keeps_first_duplicate() {
        let index = EducationIndex::new(vec![
            record(1001, "Autauga", 21.3),
            record(1001, "Shadow", 99.0),
            record(1003, "Baldwin", 28.6),
        ]);
        assert_eq!(index.len(), 2);
        assert_eq!(index.get(1001).unwrap().area_name, "Autauga");
        assert!(index.lookup(None).is_none());
        assert!(index.lookup(Some(9999)).is_none());
        assert_eq!(index.lookup(Some(1003)).unwrap().bachelors_or_higher, 28.6);
    }
}
