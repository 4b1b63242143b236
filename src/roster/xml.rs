//! Element/attribute layout of the data store:
//!
//! ```xml
//! <DataStore>
//!   <family>
//!     <person name="Ann">
//!       <history recipient="Cat" year="2020"/>
//!     </person>
//!   </family>
//! </DataStore>
//! ```
//!
//! Names, recipients and years are attributes, so these mirror types carry
//! the `@` renames quick-xml expects while the roster types stay shared with
//! the YAML layout.

use anyhow::Result;
use quick_xml::se::Serializer;
use serde::{Deserialize, Serialize};

use super::types::{DataStore, Family, History, Person};

const ROOT: &str = "DataStore";

#[derive(Debug, Serialize, Deserialize)]
struct XmlHistory {
    #[serde(rename = "@recipient")]
    recipient: String,
    #[serde(rename = "@year")]
    year: i32,
}

#[derive(Debug, Serialize, Deserialize)]
struct XmlPerson {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "history", default, skip_serializing_if = "Vec::is_empty")]
    history: Vec<XmlHistory>,
}

#[derive(Debug, Serialize, Deserialize)]
struct XmlFamily {
    #[serde(rename = "@name", default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(rename = "person", default)]
    members: Vec<XmlPerson>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct XmlStore {
    #[serde(rename = "family", default)]
    families: Vec<XmlFamily>,
}

impl From<&DataStore> for XmlStore {
    fn from(store: &DataStore) -> Self {
        XmlStore {
            families: store
                .families
                .iter()
                .map(|f| XmlFamily {
                    name: f.name.clone(),
                    members: f
                        .members
                        .iter()
                        .map(|p| XmlPerson {
                            name: p.name.clone(),
                            history: p
                                .history
                                .iter()
                                .map(|h| XmlHistory {
                                    recipient: h.recipient.clone(),
                                    year: h.year,
                                })
                                .collect(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

impl From<XmlStore> for DataStore {
    fn from(doc: XmlStore) -> Self {
        DataStore::new(
            doc.families
                .into_iter()
                .map(|f| Family {
                    name: f.name,
                    members: f
                        .members
                        .into_iter()
                        .map(|p| Person {
                            name: p.name,
                            history: p
                                .history
                                .into_iter()
                                .map(|h| History {
                                    recipient: h.recipient,
                                    year: h.year,
                                })
                                .collect(),
                        })
                        .collect(),
                })
                .collect(),
        )
    }
}

pub(crate) fn from_xml(text: &str) -> Result<DataStore> {
    let doc: XmlStore = quick_xml::de::from_str(text)?;
    Ok(doc.into())
}

pub(crate) fn to_xml(store: &DataStore) -> Result<String> {
    let mut text = String::new();
    let mut ser = Serializer::with_root(&mut text, Some(ROOT))?;
    ser.indent(' ', 2);
    XmlStore::from(store).serialize(ser)?;
    text.push('\n');
    Ok(text)
}
