use crate::protocol::{IconStoreError, SearchHit};

use super::config::LOCAL_SET;
use super::LocalIconStore;

impl LocalIconStore {
    /// Case-sensitive substring match on basenames.
    ///
    /// `"prefix:term"` searches a single set (`local` is the root set); a bare
    /// term searches every set. A colon with an empty side on either end is
    /// rejected.
    pub async fn search(&self, query: &str) -> Result<Vec<SearchHit>, IconStoreError> {
        if let Some((prefix, term)) = query.split_once(':') {
            if prefix.is_empty() || term.is_empty() {
                return Err(IconStoreError::InvalidIconName {
                    query: query.to_string(),
                });
            }

            let set = (prefix != LOCAL_SET).then_some(prefix);
            let hits: Vec<SearchHit> = self
                .list_icons(set)
                .await
                .into_iter()
                .filter(|icon| icon.basename.contains(term))
                .map(|icon| SearchHit {
                    basename: icon.basename,
                    prefix: prefix.to_string(),
                })
                .collect();
            tracing::debug!("Search {:?} matched {} icons", query, hits.len());
            return Ok(hits);
        }

        let hits: Vec<SearchHit> = self
            .list_all_icons()
            .await
            .into_iter()
            .filter(|entry| entry.icon.basename.contains(query))
            .map(|entry| SearchHit {
                basename: entry.icon.basename,
                prefix: entry.icon_set,
            })
            .collect();
        tracing::debug!("Search {:?} matched {} icons", query, hits.len());
        Ok(hits)
    }
}
