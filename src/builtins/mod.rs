// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

pub mod collections;
pub mod comparisons;
pub mod conversions;
pub mod operators;
pub mod optionals;
#[cfg(feature = "regex")]
pub mod regex;
pub mod strings;
pub mod time;
pub mod utils;

use crate::decls::{DeclError, Declarations};
use crate::Rc;

use log::debug;

/// Adds every standard function and operator to `d`.
pub fn register(d: &mut Declarations) -> Result<(), DeclError> {
    operators::register(d)?;
    comparisons::register(d)?;
    collections::register(d)?;
    strings::register(d)?;
    #[cfg(feature = "regex")]
    regex::register(d)?;
    conversions::register(d)?;
    time::register(d)?;
    optionals::register(d)?;
    Ok(())
}

fn build() -> Result<Rc<Declarations>, DeclError> {
    let mut d = Declarations::new();
    register(&mut d)?;
    debug!("standard declarations initialized");
    Ok(Rc::new(d))
}

#[cfg(feature = "arc")]
lazy_static::lazy_static! {
    static ref STANDARD: Result<Rc<Declarations>, DeclError> = build();
}

/// The standard library declarations. Built once and shared by every
/// environment layered on top of it.
#[cfg(feature = "arc")]
pub fn standard() -> Result<Rc<Declarations>, DeclError> {
    STANDARD.clone()
}

#[cfg(not(feature = "arc"))]
thread_local! {
    static STANDARD: Result<Rc<Declarations>, DeclError> = build();
}

#[cfg(not(feature = "arc"))]
pub fn standard() -> Result<Rc<Declarations>, DeclError> {
    STANDARD.with(|s| s.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_is_shared() {
        let a = standard().unwrap();
        let b = standard().unwrap();
        assert!(Rc::ptr_eq(&a, &b));
        assert!(a.find_overload("add_int64").is_some());
        assert!(a.find_overload("less_int64_double").is_some());
        assert_eq!(a.find_function("size").len(), 8);
    }
}
