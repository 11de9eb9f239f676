//! Linear merges over sorted, duplicate-free id lists.

use crate::index::DocId;
use std::cmp::Ordering;

/// Ids present in both lists
pub fn intersect(a: &[DocId], b: &[DocId]) -> Vec<DocId> {
    let mut out = Vec::with_capacity(a.len().min(b.len()));
    let (mut i, mut j) = (0, 0);

    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out
}

/// Ids present in either list
pub fn union(a: &[DocId], b: &[DocId]) -> Vec<DocId> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);

    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            Ordering::Less => {
                out.push(a[i]);
                i += 1;
            }
            Ordering::Greater => {
                out.push(b[j]);
                j += 1;
            }
            Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out.extend_from_slice(&a[i..]);
    out.extend_from_slice(&b[j..]);
    out
}

/// Ids in `0..universe` absent from `a`. Ids at or past `universe` are ignored.
pub fn complement(a: &[DocId], universe: DocId) -> Vec<DocId> {
    let mut out = Vec::with_capacity((universe as usize).saturating_sub(a.len()));
    let mut excluded = a.iter().copied().peekable();

    for id in 0..universe {
        while excluded.next_if(|&x| x < id).is_some() {}
        if excluded.next_if_eq(&id).is_none() {
            out.push(id);
        }
    }
    out
}
