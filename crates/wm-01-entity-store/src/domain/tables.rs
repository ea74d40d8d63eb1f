//! One typed table per entity kind, plus an eid → kind index.

use super::attrs::{Attr, AttrName, Attributes};
use super::entities::{
    Account, AccountGroup, Address, App, AuthReq, HdPath, Network, Site, Vault,
};
use serde::{Deserialize, Serialize};
use shared_types::Eid;
use std::collections::{BTreeMap, HashMap};

/// A row type stored in [`Tables`].
pub trait Record: Attributes + Clone + Into<Entity> + Send + Sync + 'static {
    const KIND: EntityKind;

    fn table(tables: &Tables) -> &BTreeMap<Eid, Self>;
}

macro_rules! entity_kinds {
    ($($kind:ident => $field:ident),+ $(,)?) => {
        /// Discriminant of an entity.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum EntityKind {
            $($kind),+
        }

        /// Any entity, used where kind is only known at runtime.
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        pub enum Entity {
            $($kind($kind)),+
        }

        impl Entity {
            #[must_use]
            pub fn kind(&self) -> EntityKind {
                match self {
                    $(Self::$kind(_) => EntityKind::$kind),+
                }
            }

            fn as_attributes(&self) -> &dyn Attributes {
                match self {
                    $(Self::$kind(e) => e),+
                }
            }

            fn as_attributes_mut(&mut self) -> &mut dyn Attributes {
                match self {
                    $(Self::$kind(e) => e),+
                }
            }
        }

        $(
            impl From<$kind> for Entity {
                fn from(entity: $kind) -> Self {
                    Self::$kind(entity)
                }
            }

            impl Record for $kind {
                const KIND: EntityKind = EntityKind::$kind;

                fn table(tables: &Tables) -> &BTreeMap<Eid, Self> {
                    &tables.$field
                }
            }
        )+

        /// Every table of the store.
        #[derive(Debug, Clone, Default)]
        pub struct Tables {
            kinds: HashMap<Eid, EntityKind>,
            $($field: BTreeMap<Eid, $kind>),+
        }

        impl Tables {
            pub(crate) fn insert(&mut self, eid: Eid, entity: Entity) {
                self.kinds.insert(eid, entity.kind());
                match entity {
                    $(Entity::$kind(e) => {
                        self.$field.insert(eid, e);
                    }),+
                }
            }

            pub(crate) fn remove(&mut self, eid: Eid) -> Option<Entity> {
                match self.kinds.remove(&eid)? {
                    $(EntityKind::$kind => self.$field.remove(&eid).map(Entity::$kind)),+
                }
            }

            /// Owned copy of any entity.
            #[must_use]
            pub fn entity(&self, eid: Eid) -> Option<Entity> {
                match self.kinds.get(&eid)? {
                    $(EntityKind::$kind => self.$field.get(&eid).cloned().map(Entity::$kind)),+
                }
            }

            fn scan(&self) -> impl Iterator<Item = (Eid, &dyn Attributes)> + '_ {
                std::iter::empty::<(Eid, &dyn Attributes)>()
                    $(.chain(self.$field.iter().map(|(eid, e)| (*eid, e as &dyn Attributes))))+
            }
        }
    };
}

entity_kinds! {
    HdPath => hd_paths,
    Network => networks,
    Vault => vaults,
    AccountGroup => groups,
    Account => accounts,
    Address => addresses,
    Site => sites,
    App => apps,
    AuthReq => auth_reqs,
}

impl Entity {
    #[must_use]
    pub fn references(&self) -> Vec<Eid> {
        self.as_attributes().references()
    }

    #[must_use]
    pub fn attr(&self, name: AttrName) -> Option<Attr> {
        self.as_attributes().attr(name)
    }

    pub(crate) fn set(&mut self, attr: Attr) -> Result<(), Attr> {
        self.as_attributes_mut().set(attr)
    }

    pub(crate) fn retract(&mut self, name: AttrName) -> bool {
        self.as_attributes_mut().retract(name)
    }
}

impl Tables {
    /// Typed lookup.
    #[must_use]
    pub fn get<T: Record>(&self, eid: Eid) -> Option<&T> {
        T::table(self).get(&eid)
    }

    /// All rows of one kind, in eid order.
    pub fn all<T: Record>(&self) -> impl Iterator<Item = (Eid, &T)> + '_ {
        T::table(self).iter().map(|(eid, e)| (*eid, e))
    }

    /// Rows of one kind matching a predicate.
    pub fn find<'a, T: Record, F>(&'a self, pred: F) -> impl Iterator<Item = (Eid, &'a T)> + 'a
    where
        F: Fn(&T) -> bool + 'a,
    {
        self.all::<T>().filter(move |(_, e)| pred(e))
    }

    /// Number of rows of one kind.
    #[must_use]
    pub fn count<T: Record>(&self) -> usize {
        T::table(self).len()
    }

    #[must_use]
    pub fn kind(&self, eid: Eid) -> Option<EntityKind> {
        self.kinds.get(&eid).copied()
    }

    #[must_use]
    pub fn contains(&self, eid: Eid) -> bool {
        self.kinds.contains_key(&eid)
    }

    /// Total number of entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Eids of every entity whose attribute equals `value`.
    #[must_use]
    pub fn query(&self, value: &Attr) -> Vec<Eid> {
        let name = value.name();
        self.scan()
            .filter(|(_, e)| e.attr(name).as_ref() == Some(value))
            .map(|(eid, _)| eid)
            .collect()
    }

    /// Eids of `T` rows that reference `target`.
    #[must_use]
    pub fn referrers<T: Record>(&self, target: Eid) -> Vec<Eid> {
        self.all::<T>()
            .filter(|(_, e)| e.references().contains(&target))
            .map(|(eid, _)| eid)
            .collect()
    }

    /// First entity (any kind) still referencing an eid in `gone`.
    pub(crate) fn find_dangling(&self, gone: &[Eid]) -> Option<(Eid, Eid)> {
        self.scan().find_map(|(eid, e)| {
            e.references()
                .into_iter()
                .find(|r| gone.contains(r))
                .map(|r| (eid, r))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hd_path(name: &str) -> HdPath {
        HdPath {
            name: name.into(),
            value: "m/44'/503'/0'/0".into(),
        }
    }

    #[test]
    fn test_insert_remove_roundtrip() {
        let mut tables = Tables::default();
        tables.insert(Eid(1), hd_path("cfx").into());

        assert_eq!(tables.kind(Eid(1)), Some(EntityKind::HdPath));
        assert_eq!(tables.get::<HdPath>(Eid(1)).map(|p| p.name.as_str()), Some("cfx"));
        assert!(tables.get::<Network>(Eid(1)).is_none());

        let removed = tables.remove(Eid(1));
        assert!(matches!(removed, Some(Entity::HdPath(_))));
        assert!(tables.is_empty());
    }

    #[test]
    fn test_query_by_attribute() {
        let mut tables = Tables::default();
        tables.insert(Eid(1), hd_path("cfx").into());
        tables.insert(Eid(2), hd_path("eth").into());

        assert_eq!(tables.query(&Attr::Name("eth".into())), vec![Eid(2)]);
        assert!(tables.query(&Attr::Name("btc".into())).is_empty());
    }
}
