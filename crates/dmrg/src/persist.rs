use crate::error::DmrgError;
use serde::de::{self, IgnoredAny, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tn::{Mps, Tensor3};

/// On-disk snapshot of an `Mps`, keyed the way the reference solver's own
/// restart files are: one entry `gauge_site` (the gauge position) plus one
/// entry `tensor_0` .. `tensor_{N-1}` per site (spec §6 "save/load"), so a
/// run can resume from the last saved sweep (spec §4.7).
pub struct MpsSnapshot {
    pub gauge_site: usize,
    pub sites: Vec<Tensor3>,
}

impl From<&Mps> for MpsSnapshot {
    fn from(mps: &Mps) -> Self {
        Self {
            gauge_site: mps.gauge,
            sites: mps.sites.clone(),
        }
    }
}

impl From<MpsSnapshot> for Mps {
    fn from(snap: MpsSnapshot) -> Self {
        Mps {
            sites: snap.sites,
            gauge: snap.gauge_site,
        }
    }
}

impl Serialize for MpsSnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1 + self.sites.len()))?;
        map.serialize_entry("gauge_site", &self.gauge_site)?;
        for (i, t) in self.sites.iter().enumerate() {
            map.serialize_entry(&format!("tensor_{i}"), t)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for MpsSnapshot {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct SnapshotVisitor;

        impl<'de> Visitor<'de> for SnapshotVisitor {
            type Value = MpsSnapshot;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map with a `gauge_site` entry and `tensor_i` entries")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut gauge_site: Option<usize> = None;
                let mut tensors: BTreeMap<usize, Tensor3> = BTreeMap::new();

                while let Some(key) = map.next_key::<String>()? {
                    if key == "gauge_site" {
                        gauge_site = Some(map.next_value()?);
                    } else if let Some(idx_str) = key.strip_prefix("tensor_") {
                        let idx: usize = idx_str.parse().map_err(de::Error::custom)?;
                        tensors.insert(idx, map.next_value()?);
                    } else {
                        let _: IgnoredAny = map.next_value()?;
                    }
                }

                let gauge_site = gauge_site.ok_or_else(|| de::Error::missing_field("gauge_site"))?;
                Ok(MpsSnapshot { gauge_site, sites: tensors.into_values().collect() })
            }
        }

        deserializer.deserialize_map(SnapshotVisitor)
    }
}

pub fn save<P: AsRef<Path>>(mps: &Mps, path: P) -> Result<(), DmrgError> {
    let file = File::create(path).map_err(|e| DmrgError::Persistence(e.to_string()))?;
    let writer = BufWriter::new(file);
    let snap = MpsSnapshot::from(mps);
    serde_json::to_writer(writer, &snap).map_err(|e| DmrgError::Persistence(e.to_string()))
}

pub fn load<P: AsRef<Path>>(path: P) -> Result<Mps, DmrgError> {
    let file = File::open(path).map_err(|e| DmrgError::Persistence(e.to_string()))?;
    let reader = BufReader::new(file);
    let snap: MpsSnapshot =
        serde_json::from_reader(reader).map_err(|e| DmrgError::Persistence(e.to_string()))?;
    Ok(snap.into())
}
