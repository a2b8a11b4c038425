//! Campaign data facade.
//!
//! The campaign manager keeps its party, encounters and locations as three
//! catalogs. Each list entry is stored under its `id` (or its position when it
//! has none) so single entries stay addressable through the `db.*` macros.
//! The saved order of each list is kept in the `campaign_order` catalog.

use std::cmp::Ordering;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::errors::ServiceError;
use crate::rpc::FunctionTable;
use crate::storage::{Catalog, CatalogStore};

const SAVE_OP: &str = "campaign.saveSection";

/// Catalog holding, per section name, the entry keys in saved order.
pub const ORDER_CATALOG: &str = "campaign_order";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Party,
    Encounters,
    Locations,
}

impl Section {
    pub const ALL: [Section; 3] = [Section::Party, Section::Encounters, Section::Locations];

    pub fn catalog_name(self) -> &'static str {
        match self {
            Section::Party => "party",
            Section::Encounters => "encounters",
            Section::Locations => "locations",
        }
    }
}

impl FromStr for Section {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Section::ALL
            .into_iter()
            .find(|section| section.catalog_name() == s)
            .ok_or_else(|| ServiceError::not_found(&format!("campaign section {s:?}")))
    }
}

/// Everything the campaign manager shows at once.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CampaignSnapshot {
    #[serde(default)]
    pub party: Vec<Value>,
    #[serde(default)]
    pub encounters: Vec<Value>,
    #[serde(default)]
    pub locations: Vec<Value>,
}

#[derive(Clone)]
pub struct CampaignData {
    store: Arc<CatalogStore>,
}

impl CampaignData {
    pub fn new(store: Arc<CatalogStore>) -> Self { Self { store } }

    /// Entries of one section in the order they were saved.
    ///
    /// Entries added since the last save (for example through `db.setObject`)
    /// follow, ordered by key with numeric keys compared numerically.
    pub async fn load_section(&self, section: Section) -> Vec<Value> {
        let mut catalog = self.store.get_catalog(section.catalog_name()).await;
        let saved = self.store.get_object(ORDER_CATALOG, section.catalog_name(), Value::Null).await;

        let mut items = Vec::with_capacity(catalog.len());
        for key in saved.as_array().into_iter().flatten().filter_map(Value::as_str) {
            if let Some(item) = catalog.remove(key) {
                items.push(item);
            }
        }
        let mut rest: Vec<(String, Value)> = catalog.into_iter().collect();
        rest.sort_by(|(a, _), (b, _)| compare_keys(a, b));
        items.extend(rest.into_iter().map(|(_, v)| v));
        items
    }

    /// Replace a section with `items`. Duplicate ids reject the whole save.
    pub async fn save_section(&self, section: Section, items: &[Value]) -> bool {
        let (catalog, order) = match to_catalog(items) {
            Ok(built) => built,
            Err(e) => {
                self.store.report(SAVE_OP, Some(section.catalog_name()), &e);
                return false;
            }
        };
        self.store.set_catalog(section.catalog_name(), &Value::Object(catalog)).await
            && self.store.set_object(ORDER_CATALOG, section.catalog_name(), json!(order)).await
    }

    pub async fn load_all(&self) -> CampaignSnapshot {
        CampaignSnapshot {
            party: self.load_section(Section::Party).await,
            encounters: self.load_section(Section::Encounters).await,
            locations: self.load_section(Section::Locations).await,
        }
    }

    /// Save every section; `true` only if all three saves succeeded.
    pub async fn save_all(&self, snapshot: &CampaignSnapshot) -> bool {
        let party = self.save_section(Section::Party, &snapshot.party).await;
        let encounters = self.save_section(Section::Encounters, &snapshot.encounters).await;
        let locations = self.save_section(Section::Locations, &snapshot.locations).await;
        party && encounters && locations
    }
}

fn entry_key(item: &Value, position: usize) -> String {
    match item.get("id") {
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
        _ => position.to_string(),
    }
}

/// Catalog of `items` keyed by id, plus the keys in list order.
fn to_catalog(items: &[Value]) -> Result<(Catalog, Vec<String>), ServiceError> {
    let mut catalog = Catalog::new();
    let mut order = Vec::with_capacity(items.len());
    for (position, item) in items.iter().enumerate() {
        let key = entry_key(item, position);
        if catalog.insert(key.clone(), item.clone()).is_some() {
            return Err(ServiceError::Validation(format!("duplicate entry id {key:?}")));
        }
        order.push(key);
    }
    Ok((catalog, order))
}

fn compare_keys(a: &str, b: &str) -> Ordering {
    match (a.parse::<i64>(), b.parse::<i64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// Register the campaign predicates and transformers.
///
/// - `campaign.discovered`: locations with `discovered == true`
/// - `campaign.wounded`: creatures with `hp.current < hp.max`
/// - `campaign.longRest`: restores `hp.current` to `hp.max`
pub fn register_functions(table: &mut FunctionTable) {
    table
        .register_predicate("campaign.discovered", |v, _| v.get("discovered") == Some(&Value::Bool(true)))
        .register_predicate("campaign.wounded", |v, _| match hit_points(v) {
            Some((current, max)) => current < max,
            None => false,
        })
        .register_transformer("campaign.longRest", |v, _| match hit_points(v) {
            Some((_, max)) => {
                let mut healed = v.clone();
                healed["hp"]["current"] = json!(max);
                healed
            }
            None => v.clone(),
        });
}

fn hit_points(v: &Value) -> Option<(i64, i64)> {
    let hp = v.get("hp")?;
    Some((hp.get("current")?.as_i64()?, hp.get("max")?.as_i64()?))
}
