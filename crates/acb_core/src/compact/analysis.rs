//! Summaries over a decoded stream: which tables are referenced, how
//! extended values are distributed, and where array elements cluster.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::DecodedStream;
use super::entry::{ExtendedValue, Record};
use super::types::lookup_type;

/// Array elements whose start offsets are closer than this belong to the
/// same cluster.
pub const CLUSTER_GAP: usize = 100;
pub const SAMPLES_PER_SUBTYPE: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableRefGroup {
    pub table_id: u8,
    pub type_name: Option<&'static str>,
    pub type_hash: Option<u32>,
    pub count: usize,
    pub property_ids: Vec<u8>,
    pub first_offset: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtendedSample {
    pub offset: usize,
    pub value: ExtendedValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubtypeGroup {
    pub subtype: u8,
    pub count: usize,
    pub samples: Vec<ExtendedSample>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ElementCluster {
    pub start: usize,
    /// Start offset of the cluster's last element.
    pub last_offset: usize,
    pub count: usize,
    /// Element counts keyed by element type byte.
    pub element_types: BTreeMap<u8, usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamAnalysis {
    pub table_refs: Vec<TableRefGroup>,
    pub extended: Vec<SubtypeGroup>,
    pub clusters: Vec<ElementCluster>,
}

pub fn analyze(stream: &DecodedStream) -> StreamAnalysis {
    StreamAnalysis {
        table_refs: group_table_refs(stream),
        extended: group_extended(stream),
        clusters: cluster_array_elements(stream),
    }
}

pub fn group_table_refs(stream: &DecodedStream) -> Vec<TableRefGroup> {
    let mut groups: BTreeMap<u8, (usize, BTreeSet<u8>, usize)> = BTreeMap::new();
    for entry in &stream.entries {
        if let Record::TableRef {
            table_id,
            property_id,
        } = entry.record
        {
            let group = groups
                .entry(table_id)
                .or_insert_with(|| (0, BTreeSet::new(), entry.offset));
            group.0 += 1;
            group.1.insert(property_id);
        }
    }

    groups
        .into_iter()
        .map(|(table_id, (count, properties, first_offset))| {
            let known = lookup_type(table_id);
            TableRefGroup {
                table_id,
                type_name: known.map(|t| t.type_name),
                type_hash: known.filter(|t| !t.is_placeholder()).map(|t| t.type_hash),
                count,
                property_ids: properties.into_iter().collect(),
                first_offset,
            }
        })
        .collect()
}

pub fn group_extended(stream: &DecodedStream) -> Vec<SubtypeGroup> {
    let mut groups: BTreeMap<u8, SubtypeGroup> = BTreeMap::new();
    for entry in &stream.entries {
        if let Record::Extended { subtype, value } = &entry.record {
            let group = groups.entry(*subtype).or_insert_with(|| SubtypeGroup {
                subtype: *subtype,
                count: 0,
                samples: Vec::new(),
            });
            group.count += 1;
            if group.samples.len() < SAMPLES_PER_SUBTYPE {
                group.samples.push(ExtendedSample {
                    offset: entry.offset,
                    value: value.clone(),
                });
            }
        }
    }
    groups.into_values().collect()
}

pub fn cluster_array_elements(stream: &DecodedStream) -> Vec<ElementCluster> {
    let mut clusters: Vec<ElementCluster> = Vec::new();
    for entry in &stream.entries {
        let Record::ArrayElement { element_type, .. } = entry.record else {
            continue;
        };
        match clusters.last_mut() {
            Some(cluster) if entry.offset - cluster.last_offset < CLUSTER_GAP => {
                cluster.last_offset = entry.offset;
                cluster.count += 1;
                *cluster.element_types.entry(element_type).or_default() += 1;
            }
            _ => clusters.push(ElementCluster {
                start: entry.offset,
                last_offset: entry.offset,
                count: 1,
                element_types: BTreeMap::from([(element_type, 1)]),
            }),
        }
    }
    clusters
}
