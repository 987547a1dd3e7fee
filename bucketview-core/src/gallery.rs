use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::media::{CaptureDate, MediaKind};
use crate::s3::ObjectStore;

/// Grouping key for objects whose key carries no parseable date.
///
/// Sorts after every `YYYY-MM-DD` key under plain string ordering, so
/// undated media always trails the dated groups.
pub const UNKNOWN_DATE: &str = "Unknown";

/// How many presign calls may be in flight at once. Keeps very large
/// buckets from opening unbounded outbound connections.
pub const PRESIGN_WORKERS: usize = 50;

/// One gallery entry: presigned access URL, optional presigned thumbnail,
/// and media kind. Built per request, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct MediaItem {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumb_url: Option<String>,
    pub kind: MediaKind,
}

/// Date-grouped gallery, ordered ascending by date key.
pub type GalleryIndex = BTreeMap<String, Vec<MediaItem>>;

/// Optional year/month restriction on dated objects.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    pub year: Option<String>,
    pub month: Option<String>,
}

impl Filter {
    /// Build a filter from form-style inputs, treating empty strings as
    /// unset.
    pub fn new(year: Option<String>, month: Option<String>) -> Self {
        Self {
            year: year.filter(|y| !y.is_empty()),
            month: month.filter(|m| !m.is_empty()),
        }
    }

    fn matches(&self, date: &CaptureDate) -> bool {
        self.year.as_deref().is_none_or(|y| y == date.year)
            && self.month.as_deref().is_none_or(|m| m == date.month)
    }
}

/// The companion thumbnail key for an object: same key under `thumbs/`.
/// The thumbnail is assumed to exist, not verified.
pub fn thumbnail_key(key: &str) -> String {
    format!("thumbs/{key}")
}

/// An object whose primary presign succeeded.
struct PresignedObject {
    key: String,
    url: String,
    thumb_url: Option<String>,
}

/// Build the gallery index for one bucket.
///
/// Enumerates every key, presigns across a bounded worker pool, then
/// classifies, filters and groups by date. Per-object failures are logged
/// and skipped; the build itself never fails, it only shrinks.
pub async fn build_gallery<S>(store: &S, bucket: &str, filter: &Filter) -> GalleryIndex
where
    S: ObjectStore + Clone + 'static,
{
    tracing::info!("Listing objects in bucket: {}", bucket);

    let keys = match store.list_all_objects(bucket).await {
        Ok(keys) => keys,
        Err(e) => {
            tracing::error!("Error retrieving objects from bucket {}: {}", bucket, e);
            return GalleryIndex::new();
        }
    };

    if keys.is_empty() {
        tracing::warn!("No contents found in bucket {}", bucket);
        return GalleryIndex::new();
    }

    let presigned = presign_all(store, bucket, keys).await;
    group_items(presigned, filter)
}

/// Presign every key with at most [`PRESIGN_WORKERS`] calls in flight.
///
/// Each worker presigns the primary object; on success it presigns the
/// `thumbs/` companion as a follow-up on the same worker. Results arrive
/// in completion order, which is fine: the index sorts at grouping time.
async fn presign_all<S>(store: &S, bucket: &str, keys: Vec<String>) -> Vec<PresignedObject>
where
    S: ObjectStore + Clone + 'static,
{
    let semaphore = Arc::new(Semaphore::new(PRESIGN_WORKERS));
    let mut tasks = JoinSet::new();

    for key in keys {
        let store = store.clone();
        let bucket = bucket.to_string();
        let semaphore = Arc::clone(&semaphore);

        tasks.spawn(async move {
            let Ok(_permit) = semaphore.acquire_owned().await else {
                // Semaphore is never closed while tasks run.
                return None;
            };

            let url = match store.presign_get(&bucket, &key).await {
                Ok(url) => url,
                Err(e) => {
                    tracing::error!("Error processing key {}: {}", key, e);
                    return None;
                }
            };

            let thumb_url = match store.presign_get(&bucket, &thumbnail_key(&key)).await {
                Ok(url) => Some(url),
                Err(e) => {
                    tracing::warn!("No thumbnail URL for {}: {}", key, e);
                    None
                }
            };

            Some(PresignedObject {
                key,
                url,
                thumb_url,
            })
        });
    }

    let mut presigned = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Some(object)) => presigned.push(object),
            Ok(None) => {}
            Err(e) => tracing::error!("Presign task failed: {}", e),
        }
    }
    presigned
}

/// Classify, filter and group presigned objects into the final index.
///
/// Unsupported keys are dropped. Dated keys must pass the filter; undated
/// keys go under [`UNKNOWN_DATE`] regardless of any active filter,
/// matching the long-standing behavior that undated media always shows.
fn group_items(objects: Vec<PresignedObject>, filter: &Filter) -> GalleryIndex {
    let mut index = GalleryIndex::new();

    for object in objects {
        let Some(kind) = MediaKind::classify(&object.key) else {
            continue;
        };

        let date_key = match CaptureDate::from_key(&object.key) {
            Some(date) => {
                if !filter.matches(&date) {
                    continue;
                }
                date.date_key()
            }
            None => UNKNOWN_DATE.to_string(),
        };

        index.entry(date_key).or_default().push(MediaItem {
            url: object.url,
            thumb_url: object.thumb_url,
            kind,
        });
    }

    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use async_trait::async_trait;
    use std::collections::HashSet;

    /// In-memory stand-in for the storage gateway with per-key presign
    /// failures and an optional listing failure.
    #[derive(Clone, Default)]
    struct FakeStore {
        keys: Vec<String>,
        fail_presign: HashSet<String>,
        fail_listing: bool,
    }

    #[async_trait]
    impl ObjectStore for FakeStore {
        async fn list_all_objects(&self, bucket: &str) -> Result<Vec<String>, StorageError> {
            if self.fail_listing {
                return Err(StorageError::ListObjects {
                    bucket: bucket.to_string(),
                    source: "storage offline".into(),
                });
            }
            Ok(self.keys.clone())
        }

        async fn presign_get(&self, bucket: &str, key: &str) -> Result<String, StorageError> {
            if self.fail_presign.contains(key) {
                return Err(StorageError::Presign {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                    source: "access denied".into(),
                });
            }
            Ok(format!("https://s3.example.com/{key}?sig=abc"))
        }
    }

    fn presigned(key: &str) -> PresignedObject {
        PresignedObject {
            key: key.to_string(),
            url: format!("https://s3.example.com/{key}?sig=abc"),
            thumb_url: Some(format!("https://s3.example.com/thumbs/{key}?sig=abc")),
        }
    }

    fn no_filter() -> Filter {
        Filter::default()
    }

    #[test]
    fn empty_input_yields_empty_index() {
        let index = group_items(Vec::new(), &no_filter());
        assert!(index.is_empty());
    }

    #[test]
    fn groups_by_date_key_ascending() {
        let index = group_items(
            vec![
                presigned("20240220_b.jpg"),
                presigned("20230115_a.jpg"),
                presigned("20230115_c.mp4"),
            ],
            &no_filter(),
        );

        let dates: Vec<&String> = index.keys().collect();
        assert_eq!(dates, ["2023-01-15", "2024-02-20"]);
        assert_eq!(index["2023-01-15"].len(), 2);
        assert_eq!(index["2024-02-20"].len(), 1);
        assert_eq!(index["2023-01-15"][1].kind, MediaKind::Video);
    }

    #[test]
    fn unsupported_keys_are_dropped() {
        let index = group_items(
            vec![presigned("20230115_a.jpg"), presigned("20230115_notes.txt")],
            &no_filter(),
        );
        assert_eq!(index.values().map(Vec::len).sum::<usize>(), 1);
    }

    #[test]
    fn year_filter_selects_matching_year_only() {
        let objects = vec![presigned("20230115_x.jpg"), presigned("20240220_y.jpg")];
        let filter = Filter::new(Some("2023".to_string()), None);
        let index = group_items(objects, &filter);

        assert_eq!(index.len(), 1);
        assert!(index.contains_key("2023-01-15"));
    }

    #[test]
    fn year_and_month_filter_must_both_match() {
        let objects = vec![presigned("20230115_x.jpg"), presigned("20240220_y.jpg")];
        let filter = Filter::new(Some("2023".to_string()), Some("02".to_string()));
        let index = group_items(objects, &filter);

        assert!(index.is_empty());
    }

    #[test]
    fn month_filter_alone_spans_years() {
        let objects = vec![
            presigned("20230215_x.jpg"),
            presigned("20240220_y.jpg"),
            presigned("20240615_z.jpg"),
        ];
        let filter = Filter::new(None, Some("02".to_string()));
        let index = group_items(objects, &filter);

        let dates: Vec<&String> = index.keys().collect();
        assert_eq!(dates, ["2023-02-15", "2024-02-20"]);
    }

    #[test]
    fn undated_keys_ignore_active_filters() {
        let objects = vec![presigned("party.jpg"), presigned("20240220_y.jpg")];
        let filter = Filter::new(Some("1999".to_string()), Some("01".to_string()));
        let index = group_items(objects, &filter);

        assert_eq!(index.len(), 1);
        assert_eq!(index[UNKNOWN_DATE].len(), 1);
    }

    #[test]
    fn unknown_sorts_after_dated_groups() {
        let index = group_items(
            vec![presigned("party.jpg"), presigned("20230115_a.jpg")],
            &no_filter(),
        );

        let dates: Vec<&String> = index.keys().collect();
        assert_eq!(dates, ["2023-01-15", UNKNOWN_DATE]);
    }

    #[test]
    fn missing_thumbnail_keeps_the_item() {
        let mut object = presigned("20230115_a.jpg");
        object.thumb_url = None;
        let index = group_items(vec![object], &no_filter());

        let item = &index["2023-01-15"][0];
        assert!(item.thumb_url.is_none());
        assert!(!item.url.is_empty());
    }

    #[test]
    fn grouping_is_idempotent_over_identical_inputs() {
        let objects = || {
            vec![
                presigned("20230115_a.jpg"),
                presigned("20230115_b.mp4"),
                presigned("party.gif"),
            ]
        };
        let first = group_items(objects(), &no_filter());
        let second = group_items(objects(), &no_filter());

        let shape =
            |index: &GalleryIndex| -> Vec<(String, usize)> {
                index
                    .iter()
                    .map(|(date, items)| (date.clone(), items.len()))
                    .collect()
            };
        assert_eq!(shape(&first), shape(&second));
    }

    #[test]
    fn empty_string_filters_are_treated_as_unset() {
        let filter = Filter::new(Some(String::new()), Some(String::new()));
        assert!(filter.year.is_none());
        assert!(filter.month.is_none());
    }

    #[tokio::test]
    async fn one_failed_presign_among_ten_yields_nine_items() {
        let keys: Vec<String> = (1..=10).map(|day| format!("202301{day:02}_p.jpg")).collect();
        let mut store = FakeStore {
            keys: keys.clone(),
            ..FakeStore::default()
        };
        store.fail_presign.insert(keys[3].clone());

        let index = build_gallery(&store, "photos", &no_filter()).await;

        let total: usize = index.values().map(Vec::len).sum();
        assert_eq!(total, 9);
        // The failed key is gone entirely, not present as a placeholder
        assert!(!index.contains_key("2023-01-04"));
        assert!(index.values().flatten().all(|item| !item.url.is_empty()));
    }

    #[tokio::test]
    async fn empty_bucket_builds_an_empty_index() {
        let store = FakeStore::default();
        let index = build_gallery(&store, "photos", &no_filter()).await;
        assert!(index.is_empty());
    }

    #[tokio::test]
    async fn listing_failure_degrades_to_an_empty_index() {
        let store = FakeStore {
            keys: vec!["20230115_a.jpg".to_string()],
            fail_listing: true,
            ..FakeStore::default()
        };
        let index = build_gallery(&store, "photos", &no_filter()).await;
        assert!(index.is_empty());
    }

    #[tokio::test]
    async fn thumbnail_presign_failure_keeps_the_item_without_thumb() {
        let mut store = FakeStore {
            keys: vec!["20230115_a.jpg".to_string()],
            ..FakeStore::default()
        };
        store
            .fail_presign
            .insert(thumbnail_key("20230115_a.jpg"));

        let index = build_gallery(&store, "photos", &no_filter()).await;

        let item = &index["2023-01-15"][0];
        assert!(item.thumb_url.is_none());
        assert!(!item.url.is_empty());
    }

    #[test]
    fn thumbnail_key_prefixes_the_full_key() {
        assert_eq!(thumbnail_key("20240101_a.jpg"), "thumbs/20240101_a.jpg");
        assert_eq!(thumbnail_key("2024/a.jpg"), "thumbs/2024/a.jpg");
    }
}
