//! Admin dashboard reports, recomputed on demand from raw chat and complaint
//! history.
//!
//! Every calendar-day bucket is taken in one fixed reference offset so "today"
//! means the same thing in every figure.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};
use grievance_core::document::{with_retry, DocumentStore};
use grievance_core::types::{ADMIN_ISSUES, CHAT_HISTORY};
use grievance_core::{GrievanceError, GrievanceResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// Trailing windows, in days, including today.
const WEEK_DAYS: i64 = 7;
const MONTH_DAYS: i64 = 30;

/// Upper bound on conversations returned by one listing.
pub const MAX_RECENT_CONVERSATIONS: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyActive {
    pub date: NaiveDate,
    pub users: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    pub total_users: u64,
    pub active_today: u64,
    pub new_today: u64,
    /// Users active on at least two distinct days.
    pub returning_users: u64,
    pub active_this_week: u64,
    pub active_this_month: u64,
    pub return_rate: u32,
    /// Oldest day first, ending today.
    pub daily_active: Vec<DailyActive>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryShare {
    pub category: String,
    pub count: u64,
    pub percent: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMetrics {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Distinct days with any activity.
    pub sessions: u64,
    pub messages: u64,
    pub users: u64,
}

/// One chatbot exchange as shown in the conversation listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub user_message: String,
    #[serde(default)]
    pub bot_response: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardOverview {
    pub user_stats: UserStats,
    pub categories: Vec<CategoryShare>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct Activity {
    user_id: String,
    timestamp: DateTime<Utc>,
}

pub struct ReportingAggregator {
    docs: Arc<dyn DocumentStore>,
    offset: FixedOffset,
    max_retries: u32,
}

impl ReportingAggregator {
    pub fn new(
        docs: Arc<dyn DocumentStore>,
        utc_offset_minutes: i32,
        max_retries: u32,
    ) -> GrievanceResult<Self> {
        let offset = utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                GrievanceError::Config(format!("utc offset out of range: {utc_offset_minutes} minutes"))
            })?;
        Ok(Self {
            docs,
            offset,
            max_retries,
        })
    }

    /// Calendar day of `at` in the reference offset.
    pub fn local_date(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.offset).date_naive()
    }

    pub fn overview(&self, now: DateTime<Utc>) -> GrievanceResult<DashboardOverview> {
        Ok(DashboardOverview {
            user_stats: self.user_stats(now)?,
            categories: self.category_distribution()?,
            generated_at: now,
        })
    }

    pub fn user_stats(&self, now: DateTime<Utc>) -> GrievanceResult<UserStats> {
        let today = self.local_date(now);

        let mut days_by_user: HashMap<String, BTreeSet<NaiveDate>> = HashMap::new();
        for activity in self.activity()? {
            days_by_user
                .entry(activity.user_id)
                .or_default()
                .insert(self.local_date(activity.timestamp));
        }

        let total = days_by_user.len() as u64;
        let active_since =
            |from: NaiveDate| count_users(&days_by_user, |days| days.range(from..=today).next().is_some());

        let active_today = count_users(&days_by_user, |days| days.contains(&today));
        let new_today = count_users(&days_by_user, |days| days.first() == Some(&today));
        let returning_users = count_users(&days_by_user, |days| days.len() >= 2);
        let active_this_week = active_since(today - Duration::days(WEEK_DAYS - 1));
        let active_this_month = active_since(today - Duration::days(MONTH_DAYS - 1));

        let daily_active = (0..WEEK_DAYS)
            .rev()
            .map(|back| {
                let date = today - Duration::days(back);
                DailyActive {
                    date,
                    users: count_users(&days_by_user, |days| days.contains(&date)),
                }
            })
            .collect();

        Ok(UserStats {
            total_users: total,
            active_today,
            new_today,
            returning_users,
            active_this_week,
            active_this_month,
            return_rate: percent(returning_users, total),
            daily_active,
        })
    }

    /// Complaint counts per category over the aggregate collection, most
    /// frequent first.
    pub fn category_distribution(&self) -> GrievanceResult<Vec<CategoryShare>> {
        let docs = with_retry(self.max_retries, "find categories", || {
            self.docs
                .find(ADMIN_ISSUES, &Default::default(), Some(&["category"][..]))
        })?;

        let mut order: Vec<(String, u64)> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut total = 0u64;
        for doc in docs {
            let Some(Value::String(label)) = doc.get("category") else {
                continue;
            };
            total += 1;
            match index.get(label) {
                Some(&i) => order[i].1 += 1,
                None => {
                    index.insert(label.clone(), order.len());
                    order.push((label.clone(), 1));
                }
            }
        }

        // Stable sort keeps first-seen order among equal counts.
        order.sort_by(|a, b| b.1.cmp(&a.1));
        Ok(order
            .into_iter()
            .map(|(category, count)| CategoryShare {
                category,
                count,
                percent: percent(count, total),
            })
            .collect())
    }

    /// Chat activity between two dates, both inclusive. An inverted range is empty.
    pub fn chat_metrics(&self, start: NaiveDate, end: NaiveDate) -> GrievanceResult<ChatMetrics> {
        let mut metrics = ChatMetrics {
            start,
            end,
            sessions: 0,
            messages: 0,
            users: 0,
        };
        if start > end {
            return Ok(metrics);
        }

        let mut days = HashSet::new();
        let mut users = HashSet::new();
        for activity in self.activity()? {
            let date = self.local_date(activity.timestamp);
            if date < start || date > end {
                continue;
            }
            metrics.messages += 1;
            days.insert(date);
            users.insert(activity.user_id);
        }
        metrics.sessions = days.len() as u64;
        metrics.users = users.len() as u64;
        debug!(%start, %end, messages = metrics.messages, "Chat metrics computed");
        Ok(metrics)
    }

    /// Exchanges between two dates (inclusive), newest first, at most
    /// `limit` of them and never more than [`MAX_RECENT_CONVERSATIONS`].
    pub fn recent_conversations(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        limit: usize,
    ) -> GrievanceResult<Vec<Conversation>> {
        if start > end {
            return Ok(Vec::new());
        }
        let docs = with_retry(self.max_retries, "find conversations", || {
            self.docs.find(
                CHAT_HISTORY,
                &Default::default(),
                Some(&["timestamp", "user_message", "bot_response"][..]),
            )
        })?;

        let mut out: Vec<Conversation> = docs
            .into_iter()
            .filter_map(|doc| serde_json::from_value::<Conversation>(Value::Object(doc)).ok())
            .filter(|c| {
                let date = self.local_date(c.timestamp);
                date >= start && date <= end
            })
            .collect();
        out.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        out.truncate(limit.min(MAX_RECENT_CONVERSATIONS));
        Ok(out)
    }

    fn activity(&self) -> GrievanceResult<Vec<Activity>> {
        let docs = with_retry(self.max_retries, "find chat history", || {
            self.docs
                .find(CHAT_HISTORY, &Default::default(), Some(&["user_id", "timestamp"][..]))
        })?;
        let mut out = Vec::with_capacity(docs.len());
        let mut skipped = 0usize;
        for doc in docs {
            match serde_json::from_value::<Activity>(Value::Object(doc)) {
                Ok(activity) => out.push(activity),
                Err(_) => skipped += 1,
            }
        }
        if skipped > 0 {
            warn!(skipped, "Ignoring malformed chat history records");
        }
        Ok(out)
    }
}

fn count_users(
    days_by_user: &HashMap<String, BTreeSet<NaiveDate>>,
    pred: impl Fn(&BTreeSet<NaiveDate>) -> bool,
) -> u64 {
    days_by_user.values().filter(|days| pred(days)).count() as u64
}

/// Whole-number percentage, 0 when there is nothing to divide by.
pub fn percent(part: u64, whole: u64) -> u32 {
    if whole == 0 {
        return 0;
    }
    ((part as f64 * 100.0) / whole as f64).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usage::UsageLog;
    use chrono::TimeZone;
    use grievance_core::document::Document;
    use grievance_core::types::ChatRecord;
    use grievance_core::InMemoryDocumentStore;
    use std::sync::atomic::{AtomicU32, Ordering};

    const IST: i32 = 330;

    fn chat(log: &UsageLog, user: &str, at: DateTime<Utc>) {
        log.append(&ChatRecord {
            user_id: user.into(),
            timestamp: at,
            user_message: "hi".into(),
            bot_response: "hello".into(),
        })
        .unwrap();
    }

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn setup() -> (Arc<InMemoryDocumentStore>, UsageLog, ReportingAggregator) {
        let docs = Arc::new(InMemoryDocumentStore::new());
        let log = UsageLog::new(docs.clone(), 2);
        let reports = ReportingAggregator::new(docs.clone(), IST, 2).unwrap();
        (docs, log, reports)
    }

    fn complaint_category(docs: &InMemoryDocumentStore, category: &str) {
        let mut doc = Document::new();
        doc.insert("category".into(), Value::from(category));
        docs.insert_one(ADMIN_ISSUES, doc).unwrap();
    }

    #[test]
    fn test_empty_history_yields_zeros() {
        let (_, _, reports) = setup();
        let stats = reports.user_stats(utc(2024, 3, 10, 6, 0)).unwrap();
        assert_eq!(stats.total_users, 0);
        assert_eq!(stats.return_rate, 0);
        assert_eq!(stats.daily_active.len(), 7);
        assert!(stats.daily_active.iter().all(|d| d.users == 0));
        assert!(reports.category_distribution().unwrap().is_empty());
    }

    #[test]
    fn test_user_stats_windows() {
        let (_, log, reports) = setup();
        let now = utc(2024, 3, 10, 6, 0);
        chat(&log, "u1", utc(2024, 3, 10, 4, 0));
        chat(&log, "u1", utc(2024, 3, 10, 5, 0));
        chat(&log, "u2", utc(2024, 3, 8, 4, 0));
        chat(&log, "u2", utc(2024, 3, 10, 5, 30));
        chat(&log, "u3", utc(2024, 2, 20, 4, 0));
        chat(&log, "u4", utc(2024, 1, 1, 4, 0));

        let stats = reports.user_stats(now).unwrap();
        assert_eq!(stats.total_users, 4);
        assert_eq!(stats.active_today, 2);
        assert_eq!(stats.new_today, 1);
        assert_eq!(stats.returning_users, 1);
        assert_eq!(stats.active_this_week, 2);
        assert_eq!(stats.active_this_month, 3);
        assert_eq!(stats.return_rate, 25);

        let series: Vec<u64> = stats.daily_active.iter().map(|d| d.users).collect();
        assert_eq!(series, vec![0, 0, 0, 0, 1, 0, 2]);
        assert_eq!(stats.daily_active[6].date, NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
    }

    #[test]
    fn test_day_boundary_uses_reference_offset() {
        let (_, log, reports) = setup();
        // 19:00 UTC on the 9th is 00:30 on the 10th at +05:30.
        chat(&log, "late", utc(2024, 3, 9, 19, 0));
        let stats = reports.user_stats(utc(2024, 3, 10, 1, 0)).unwrap();
        assert_eq!(stats.active_today, 1);

        let utc_reports = ReportingAggregator::new(reports.docs.clone(), 0, 2).unwrap();
        let stats = utc_reports.user_stats(utc(2024, 3, 10, 1, 0)).unwrap();
        assert_eq!(stats.active_today, 0);
    }

    #[test]
    fn test_category_distribution_order_and_percent() {
        let (docs, _, reports) = setup();
        for category in ["Food", "Electrical", "Electrical", "Civil", "Food", "Plumbing"] {
            complaint_category(&docs, category);
        }

        let shares = reports.category_distribution().unwrap();
        let labels: Vec<_> = shares.iter().map(|s| s.category.as_str()).collect();
        assert_eq!(labels, vec!["Food", "Electrical", "Civil", "Plumbing"]);
        assert_eq!(shares[0].count, 2);
        assert_eq!(shares[0].percent, 33);
        assert_eq!(shares[3].percent, 17);
    }

    #[test]
    fn test_chat_metrics_inclusive_range() {
        let (_, log, reports) = setup();
        chat(&log, "u1", utc(2024, 3, 1, 4, 0));
        chat(&log, "u1", utc(2024, 3, 1, 8, 0));
        chat(&log, "u2", utc(2024, 3, 3, 4, 0));
        chat(&log, "u3", utc(2024, 3, 5, 4, 0));

        let d = |day| NaiveDate::from_ymd_opt(2024, 3, day).unwrap();
        let metrics = reports.chat_metrics(d(1), d(3)).unwrap();
        assert_eq!(metrics.sessions, 2);
        assert_eq!(metrics.messages, 3);
        assert_eq!(metrics.users, 2);

        let inverted = reports.chat_metrics(d(5), d(1)).unwrap();
        assert_eq!((inverted.sessions, inverted.messages, inverted.users), (0, 0, 0));

        let empty = reports.chat_metrics(d(20), d(25)).unwrap();
        assert_eq!(empty.messages, 0);
    }

    #[test]
    fn test_malformed_history_skipped() {
        let (docs, log, reports) = setup();
        chat(&log, "u1", utc(2024, 3, 10, 4, 0));
        let mut junk = Document::new();
        junk.insert("user_id".into(), Value::from("u2"));
        junk.insert("timestamp".into(), Value::from("yesterday"));
        docs.insert_one(CHAT_HISTORY, junk).unwrap();

        let stats = reports.user_stats(utc(2024, 3, 10, 6, 0)).unwrap();
        assert_eq!(stats.total_users, 1);
    }

    #[test]
    fn test_percent_rounding() {
        assert_eq!(percent(0, 0), 0);
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 67);
        assert_eq!(percent(1, 8), 13);
    }

    #[test]
    fn test_offset_out_of_range() {
        let docs = Arc::new(InMemoryDocumentStore::new());
        assert!(matches!(
            ReportingAggregator::new(docs, 24 * 60, 2),
            Err(GrievanceError::Config(_))
        ));
    }

    #[test]
    fn test_recent_conversations_newest_first_and_capped() {
        let (_, log, reports) = setup();
        for hour in 0..60u32 {
            log.append(&ChatRecord {
                user_id: "u1".into(),
                timestamp: utc(2024, 3, 2, 0, 0) + Duration::minutes(hour as i64),
                user_message: format!("q{hour}"),
                bot_response: format!("a{hour}"),
            })
            .unwrap();
        }
        chat(&log, "u2", utc(2024, 3, 8, 4, 0));

        let d = |day| NaiveDate::from_ymd_opt(2024, 3, day).unwrap();
        let listed = reports.recent_conversations(d(1), d(5), 500).unwrap();
        assert_eq!(listed.len(), MAX_RECENT_CONVERSATIONS);
        assert_eq!(listed[0].user_message, "q59");
        assert_eq!(listed[0].bot_response, "a59");
        assert!(listed.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));

        let few = reports.recent_conversations(d(1), d(5), 3).unwrap();
        let messages: Vec<_> = few.iter().map(|c| c.user_message.as_str()).collect();
        assert_eq!(messages, vec!["q59", "q58", "q57"]);

        assert!(reports.recent_conversations(d(5), d(1), 10).unwrap().is_empty());
        assert_eq!(reports.recent_conversations(d(8), d(8), 10).unwrap().len(), 1);
    }

    /// Fails the first `fail_first` finds, then delegates.
    struct FlakyStore {
        inner: InMemoryDocumentStore,
        fail_first: u32,
        calls: AtomicU32,
    }

    impl DocumentStore for FlakyStore {
        fn insert_one(&self, collection: &str, document: Document) -> GrievanceResult<()> {
            self.inner.insert_one(collection, document)
        }

        fn find(
            &self,
            collection: &str,
            filter: &Document,
            projection: Option<&[&str]>,
        ) -> GrievanceResult<Vec<Document>> {
            if self.calls.fetch_add(1, Ordering::SeqCst) < self.fail_first {
                return Err(GrievanceError::StorageUnavailable("connection reset".into()));
            }
            self.inner.find(collection, filter, projection)
        }

        fn update_many(
            &self,
            collection: &str,
            filter: &Document,
            set: &Document,
            unset: &[&str],
        ) -> GrievanceResult<u64> {
            self.inner.update_many(collection, filter, set, unset)
        }
    }

    fn flaky(fail_first: u32) -> Arc<FlakyStore> {
        let store = FlakyStore {
            inner: InMemoryDocumentStore::new(),
            fail_first,
            calls: AtomicU32::new(0),
        };
        complaint_category(&store.inner, "Food");
        Arc::new(store)
    }

    #[test]
    fn test_reads_retry_transient_failures() {
        let reports = ReportingAggregator::new(flaky(2), IST, 2).unwrap();
        let shares = reports.category_distribution().unwrap();
        assert_eq!(shares.len(), 1);
        assert_eq!(shares[0].percent, 100);
    }

    #[test]
    fn test_reads_surface_persistent_failures() {
        let reports = ReportingAggregator::new(flaky(3), IST, 2).unwrap();
        let err = reports.user_stats(utc(2024, 3, 10, 6, 0)).unwrap_err();
        assert!(err.is_retryable());
    }
}
