use crate::repack::{RepackRecord, RepackRow, SearchResult};

use super::{format_name, TitleIndex};

/// A fully built index together with the records it points at.
///
/// Record `i` in `records` is the document indexed under ordinal `i`.
#[derive(Debug, Default, Clone)]
pub struct IndexState {
    records: Vec<RepackRecord>,
    index: TitleIndex,
}

impl IndexState {
    /// Build from store rows in ascending upload order. The rows are reversed
    /// so ordinal 0 is the most recent upload.
    pub fn build(rows: Vec<RepackRow>) -> Self {
        let mut index = TitleIndex::new();
        let records: Vec<RepackRecord> = rows
            .into_iter()
            .rev()
            .enumerate()
            .map(|(ordinal, row)| RepackRecord::from_row(ordinal, row))
            .collect();

        for record in &records {
            index.add(record.id, &format_name(&record.title));
        }

        Self { records, index }
    }

    pub fn records(&self) -> &[RepackRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn key_count(&self) -> usize {
        self.index.key_count()
    }

    /// Normalize `query` and resolve the matching ordinals to results.
    pub fn search(&self, query: &str, limit: usize) -> Vec<SearchResult> {
        self.index
            .search(&format_name(query), limit)
            .into_iter()
            .filter_map(|ordinal| self.records.get(ordinal))
            .map(SearchResult::from)
            .collect()
    }
}
