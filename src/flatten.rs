//! Turning a composed definition tree into one name -> attribute
//! lookup table, so that fragments can be found wherever in the tree
//! they were declared.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use kstring::KString;

use crate::attribute::Attribute;
use crate::attribute_context::AttributeSource;
use crate::definition::{Definition, DefinitionResolver};
use crate::error::ViewError;
use crate::tiles_context::TilesRequestContext;


/// An attribute found in the tree, with the definitions it was
/// declared in: outermost first, the declaring one last. Empty for
/// attributes added at request time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatAttribute {
    pub attribute: Attribute,
    pub enclosing: Vec<Arc<Definition>>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FlatAttributeMap(HashMap<KString, FlatAttribute>);

impl FlatAttributeMap {
    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.0.get(name).map(|e| &e.attribute)
    }
    pub fn entry(&self, name: &str) -> Option<&FlatAttribute> {
        self.0.get(name)
    }
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }
    pub fn iter(&self) -> impl Iterator<Item = (&KString, &Attribute)> {
        self.0.iter().map(|(n, e)| (n, &e.attribute))
    }
    pub fn len(&self) -> usize { self.0.len() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    /// Sorted, for stable output.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.0.keys().map(|k| k.as_str()).collect();
        names.sort();
        names
    }

    fn insert(&mut self, name: &KString, attribute: &Attribute, enclosing: &[Arc<Definition>]) {
        self.0.insert(name.clone(), FlatAttribute {
            attribute: attribute.clone(),
            enclosing: enclosing.to_vec(),
        });
    }
}


/// Collect all attributes reachable from `root`, depth first in
/// declaration order, later ones replacing earlier ones of the same
/// name; then overlay the `dynamic` attributes. A definition that is
/// already being visited further up is not entered again.
pub fn flatten<R, S>(
    root: &Arc<Definition>,
    resolver: &R,
    context: &TilesRequestContext,
    dynamic: &S,
) -> Result<FlatAttributeMap>
where R: DefinitionResolver + ?Sized,
      S: AttributeSource + ?Sized
{
    let mut result = FlatAttributeMap::default();
    let mut path: Vec<Arc<Definition>> = Vec::new();
    flatten_into(&mut result, &mut path, root, resolver, context)?;
    for (name, attribute) in dynamic.attributes() {
        result.insert(&name, &attribute, &[]);
    }
    Ok(result)
}

fn flatten_into<R>(
    result: &mut FlatAttributeMap,
    path: &mut Vec<Arc<Definition>>,
    definition: &Arc<Definition>,
    resolver: &R,
    context: &TilesRequestContext,
) -> Result<()>
where R: DefinitionResolver + ?Sized
{
    path.push(definition.clone());
    for (name, attribute) in definition.attributes() {
        result.insert(name, attribute, path);
        if let Some((refname, required)) = attribute.definition_reference() {
            if path.iter().any(|d| d.name() == refname) {
                continue
            }
            match resolver.get_definition(refname, context)? {
                Some(nested) =>
                    flatten_into(result, path, &nested, resolver, context)?,
                None if required =>
                    return Err(ViewError::DefinitionNotFound {
                        name: KString::from_ref(refname)
                    }.into()),
                // untyped value that is just text
                None => (),
            }
        }
    }
    path.pop();
    Ok(())
}
