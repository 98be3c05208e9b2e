use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{BoardError, Result};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Identifier of an [`Item`], unique within its bin and stable across moves.
    ItemId
);
string_id!(
    /// Identifier of a [`Bin`].
    BinId
);
string_id!(
    /// Identifier of a [`Page`].
    PageId
);

/// The atomic unit of a bin.
///
/// Parent/child relationships are expressed purely through ids: `parent_id` on the
/// child and `child_ids` on the parent. Children are stored as siblings of their
/// parent in the bin's flat sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: ItemId,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<ItemId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub child_ids: Vec<ItemId>,
    /// Type-specific fields; never inspected by the core.
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl Item {
    pub fn new(id: impl Into<ItemId>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            parent_id: None,
            child_ids: Vec::new(),
            payload: Map::new(),
        }
    }

    pub fn parent(mut self, parent_id: impl Into<ItemId>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn children<I, S>(mut self, child_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ItemId>,
    {
        self.child_ids.extend(child_ids.into_iter().map(Into::into));
        self
    }

    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }

    pub fn is_child(&self) -> bool {
        self.parent_id.is_some()
    }

    pub fn has_children(&self) -> bool {
        !self.child_ids.is_empty()
    }

    pub fn text(&self) -> Option<&str> {
        self.payload.get("text").and_then(Value::as_str)
    }
}

/// Load progress of a bin whose items are fetched lazily.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Unavailable,
}

/// What a droppable bin surface should currently show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Ready,
    NotLoaded,
    Loading,
    Unavailable,
}

/// A container of items ("bin").
///
/// `items` is `None` until the bin's contents are resident in memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bin {
    pub id: BinId,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    items: Option<Vec<Item>>,
    #[serde(skip)]
    load_state: LoadState,
}

impl Bin {
    pub fn new(id: impl Into<BinId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            items: Some(Vec::new()),
            load_state: LoadState::Idle,
        }
    }

    /// A bin whose items still have to be fetched.
    pub fn lazy(id: impl Into<BinId>, title: impl Into<String>) -> Self {
        Self {
            items: None,
            ..Self::new(id, title)
        }
    }

    pub fn with_items(mut self, items: impl Into<Vec<Item>>) -> Self {
        self.items = Some(items.into());
        self
    }

    pub fn items(&self) -> Option<&[Item]> {
        self.items.as_deref()
    }

    pub fn items_mut(&mut self) -> Option<&mut Vec<Item>> {
        self.items.as_mut()
    }

    pub(crate) fn resident_items(&self) -> Result<&[Item]> {
        self.items
            .as_deref()
            .ok_or_else(|| BoardError::NotResident(self.id.clone()))
    }

    pub(crate) fn resident_items_mut(&mut self) -> Result<&mut Vec<Item>> {
        let id = &self.id;
        self.items
            .as_mut()
            .ok_or_else(|| BoardError::NotResident(id.clone()))
    }

    pub fn is_resident(&self) -> bool {
        self.items.is_some()
    }

    pub fn availability(&self) -> Availability {
        if self.items.is_some() {
            return Availability::Ready;
        }
        match self.load_state {
            LoadState::Idle => Availability::NotLoaded,
            LoadState::Loading => Availability::Loading,
            LoadState::Unavailable => Availability::Unavailable,
        }
    }

    pub fn len(&self) -> usize {
        self.items.as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A page groups bins; it is the parent container a bin can be relocated to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: PageId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub bins: Vec<Bin>,
}

impl Page {
    pub fn new(id: impl Into<PageId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            bins: Vec::new(),
        }
    }

    pub fn bin(mut self, bin: Bin) -> Self {
        self.bins.push(bin);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Board {
    #[serde(default)]
    pub pages: Vec<Page>,
}

impl Board {
    pub fn new(pages: impl Into<Vec<Page>>) -> Self {
        Self {
            pages: pages.into(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn page(&self, id: &PageId) -> Option<&Page> {
        self.pages.iter().find(|page| page.id == *id)
    }

    pub fn page_index(&self, id: &PageId) -> Option<usize> {
        self.pages.iter().position(|page| page.id == *id)
    }

    /// Returns `(page index, bin index)` of a bin.
    pub fn locate_bin(&self, id: &BinId) -> Option<(usize, usize)> {
        self.pages.iter().enumerate().find_map(|(page_ix, page)| {
            page.bins
                .iter()
                .position(|bin| bin.id == *id)
                .map(|bin_ix| (page_ix, bin_ix))
        })
    }

    pub fn bin(&self, id: &BinId) -> Option<&Bin> {
        self.bins().find(|bin| bin.id == *id)
    }

    pub fn bin_mut(&mut self, id: &BinId) -> Option<&mut Bin> {
        self.pages
            .iter_mut()
            .flat_map(|page| page.bins.iter_mut())
            .find(|bin| bin.id == *id)
    }

    pub fn bins(&self) -> impl Iterator<Item = &Bin> {
        self.pages.iter().flat_map(|page| page.bins.iter())
    }

    pub(crate) fn require_bin(&self, id: &BinId) -> Result<&Bin> {
        self.bin(id).ok_or_else(|| BoardError::UnknownBin(id.clone()))
    }

    pub(crate) fn require_bin_mut(&mut self, id: &BinId) -> Result<&mut Bin> {
        self.bin_mut(id)
            .ok_or_else(|| BoardError::UnknownBin(id.clone()))
    }

    /// Marks a non-resident bin as loading.
    ///
    /// Returns `true` when the caller should start the loader for this bin. A bin
    /// that failed to load may be retried.
    pub fn begin_load(&mut self, id: &BinId) -> bool {
        let Some(bin) = self.bin_mut(id) else {
            return false;
        };
        if bin.is_resident() || bin.load_state == LoadState::Loading {
            return false;
        }
        bin.load_state = LoadState::Loading;
        tracing::debug!(target: "twodo_board::load", bin = %id, "loading bin");
        true
    }

    /// Finishes a lazy load started with [`Board::begin_load`].
    ///
    /// `Ok(None)` means the loader found nothing for this bin; it stays unavailable.
    pub fn complete_load(
        &mut self,
        id: &BinId,
        result: std::result::Result<Option<Vec<Item>>, String>,
    ) -> Result<()> {
        let bin = self.require_bin_mut(id)?;
        match result {
            Ok(Some(mut items)) => {
                crate::hierarchy::repair_links(&mut items);
                tracing::debug!(target: "twodo_board::load", bin = %id, len = items.len(), "bin loaded");
                bin.items = Some(items);
                bin.load_state = LoadState::Idle;
                Ok(())
            }
            Ok(None) => {
                bin.load_state = LoadState::Unavailable;
                Ok(())
            }
            Err(message) => {
                bin.load_state = LoadState::Unavailable;
                tracing::warn!(target: "twodo_board::load", bin = %id, %message, "bin failed to load");
                Err(BoardError::LoadFailed {
                    bin: id.clone(),
                    message,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_round_trips_wire_names_and_payload() {
        let json = r#"{
            "id": "b",
            "type": "todo",
            "parentId": "a",
            "text": "write tests",
            "done": false
        }"#;
        let item: Item = serde_json::from_str(json).unwrap();
        assert_eq!(item.kind, "todo");
        assert_eq!(item.parent_id.as_ref().map(ItemId::as_str), Some("a"));
        assert!(item.child_ids.is_empty());
        assert_eq!(item.text(), Some("write tests"));
        assert_eq!(item.payload.get("done"), Some(&Value::Bool(false)));

        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["parentId"], "a");
        assert_eq!(value["type"], "todo");
        assert!(value.get("childIds").is_none());
    }

    #[test]
    fn null_parent_is_a_root() {
        let item: Item = serde_json::from_str(r#"{ "id": "a", "parentId": null }"#).unwrap();
        assert!(!item.is_child());
    }

    #[test]
    fn bin_without_items_is_lazy() {
        let board = Board::from_json(
            r#"{ "pages": [ { "id": "p", "bins": [ { "id": "x" }, { "id": "y", "items": [] } ] } ] }"#,
        )
        .unwrap();
        let x = board.bin(&"x".into()).unwrap();
        let y = board.bin(&"y".into()).unwrap();
        assert_eq!(x.availability(), Availability::NotLoaded);
        assert_eq!(y.availability(), Availability::Ready);
        assert_eq!(board.locate_bin(&"y".into()), Some((0, 1)));
    }

    #[test]
    fn load_lifecycle() {
        let mut board = Board::new(vec![Page::new("p", "").bin(Bin::lazy("x", "X"))]);
        let x: BinId = "x".into();

        assert!(board.begin_load(&x));
        assert!(!board.begin_load(&x));
        assert_eq!(board.bin(&x).unwrap().availability(), Availability::Loading);

        let err = board.complete_load(&x, Err("offline".into())).unwrap_err();
        assert!(err.is_user_visible());
        assert_eq!(
            board.bin(&x).unwrap().availability(),
            Availability::Unavailable
        );

        assert!(board.begin_load(&x));
        board
            .complete_load(&x, Ok(Some(vec![Item::new("a", "note")])))
            .unwrap();
        assert_eq!(board.bin(&x).unwrap().len(), 1);
        assert!(!board.begin_load(&x));
    }
}
