use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::frontend::ast::Keyed;
use crate::frontend::error::{FrontendError, FrontendErrorKind};
use crate::meta::Meta;

/// alias, we use String as key everywhere in the project
pub type Env<T> = HashMap<String, T>;

pub trait UniqueEnv<ItemT, LocationT> {
    /// associates k with v if k is not bound yet, the first binding always wins
    fn insert_unique(&mut self, k: String, v: Meta<ItemT, LocationT>) -> Result<(), FrontendError<LocationT>>;
}

pub trait FromKeyedVec<ItemT, LocationT> {
    /// create an env mapping element.get_key() to element, reporting every repeated key
    fn from_vec(member_vec: &[Meta<ItemT, LocationT>]) -> (Self, Vec<FrontendError<LocationT>>)
        where Self: std::marker::Sized;
}

fn duplicate<LocationT: Clone>(k: String, location: &LocationT) -> FrontendError<LocationT> {
    FrontendError::new(FrontendErrorKind::DuplicateDeclaration { ident: k }, location.clone())
}

impl<ItemT, MetaT: Clone> UniqueEnv<ItemT, MetaT> for Env<Meta<ItemT, MetaT>> {
    /// insert items with all metadata
    fn insert_unique(&mut self, k: String, v: Meta<ItemT, MetaT>) -> Result<(), FrontendError<MetaT>> {
        match self.entry(k) {
            Entry::Occupied(entry) => Err(duplicate(entry.key().clone(), v.get_meta())),
            Entry::Vacant(entry) => {
                entry.insert(v);
                Ok(())
            }
        }
    }
}

impl<ItemT, MetaT: Clone> UniqueEnv<ItemT, MetaT> for Env<ItemT> {
    /// insert only items
    fn insert_unique(&mut self, k: String, v: Meta<ItemT, MetaT>) -> Result<(), FrontendError<MetaT>> {
        match self.entry(k) {
            Entry::Occupied(entry) => Err(duplicate(entry.key().clone(), v.get_meta())),
            Entry::Vacant(entry) => {
                entry.insert(v.item);
                Ok(())
            }
        }
    }
}

impl<ItemT: Keyed + Clone, MetaT: Clone> FromKeyedVec<ItemT, MetaT> for Env<Meta<ItemT, MetaT>> {
    fn from_vec(member_vec: &[Meta<ItemT, MetaT>]) -> (Self, Vec<FrontendError<MetaT>>) {
        let mut env = Self::new();
        let errors: Vec<_> = member_vec.iter()
            .map(|element| env.insert_unique(element.get_key().clone(), element.clone()))
            .filter_map(Result::err)
            .collect();
        (env, errors)
    }
}
