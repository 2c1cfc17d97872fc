// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::lexer::*;
use crate::*;

use core::{cmp, fmt, ops::Deref};

/// Shared, immutable node. Equality and ordering are by identity.
pub struct NodeRef<T> {
    r: Rc<T>,
}

impl<T> Clone for NodeRef<T> {
    fn clone(&self) -> Self {
        Self { r: self.r.clone() }
    }
}

impl<T: fmt::Debug> fmt::Debug for NodeRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.r.as_ref().fmt(f)
    }
}

impl<T> cmp::PartialEq for NodeRef<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::as_ptr(&self.r).eq(&Rc::as_ptr(&other.r))
    }
}

impl<T> cmp::Eq for NodeRef<T> {}

impl<T> cmp::Ord for NodeRef<T> {
    fn cmp(&self, other: &Self) -> cmp::Ordering {
        Rc::as_ptr(&self.r).cmp(&Rc::as_ptr(&other.r))
    }
}

impl<T> cmp::PartialOrd for NodeRef<T> {
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Deref for NodeRef<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.r
    }
}

impl<T> AsRef<T> for NodeRef<T> {
    fn as_ref(&self) -> &T {
        self.deref()
    }
}

impl<T> NodeRef<T> {
    pub fn new(t: T) -> Self {
        Self { r: Rc::new(t) }
    }
}

pub type Ref<T> = NodeRef<T>;

/// A statement exactly as written: `keyword [argument] (";" | "{" ... "}")`.
#[derive(Debug)]
pub struct RawStatement {
    /// Span of the keyword.
    pub span: Span,
    pub keyword: String,
    /// Argument after quote processing and `+` concatenation.
    pub argument: Option<String>,
    pub substatements: Vec<Ref<RawStatement>>,
}

impl RawStatement {
    /// Prefix of an extension keyword such as `ex:annotation`.
    pub fn keyword_prefix(&self) -> Option<&str> {
        self.keyword.split_once(':').map(|(p, _)| p)
    }

    pub fn find(&self, keyword: &str) -> Option<&Ref<RawStatement>> {
        self.substatements.iter().find(|s| s.keyword == keyword)
    }

    pub fn find_all<'a>(&'a self, keyword: &'a str) -> impl Iterator<Item = &'a Ref<RawStatement>> {
        self.substatements.iter().filter(move |s| s.keyword == keyword)
    }
}
