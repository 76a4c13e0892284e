use std::{
    fmt::{
        Display,
        Formatter,
    },
    path::Path,
    time::Duration,
};

use chrono::{
    DateTime,
    Utc,
};
use futures::prelude::*;
use tracing::Instrument;

use message::{
    Orientation,
    Packet,
};

use crate::session::Session;

/// How long before a task starts the motors are told to move.
pub const DEFAULT_MOTOR_LEAD: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Task {
    pub title:       String,
    pub start:       DateTime<Utc>,
    pub duration_ms: u64,
    pub azimuth:     f64,
    pub elevation:   f64,
}

impl Task {
    #[inline]
    pub fn orientation(&self) -> Orientation {
        Orientation::new(self.azimuth, self.elevation)
    }

    #[inline]
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    /// When to send the pointing command for a given motor lead.
    pub fn point_at(&self, lead: Duration) -> DateTime<Utc> {
        chrono::Duration::from_std(lead)
            .ok()
            .and_then(|lead| self.start.checked_sub_signed(lead))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

impl Display for Task {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Title: {}", self.title)?;
        writeln!(f, "Date: {}", self.start.format("%d/%m/%Y"))?;
        writeln!(f, "Time: {}", self.start.format("%H:%M:%S"))?;
        writeln!(f, "Duration: {} ms", self.duration_ms)?;
        writeln!(f, "Azimuth: {} degrees", self.azimuth)?;
        write!(f, "Elevation: {} degrees", self.elevation)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("reading schedule: {0}")]
    Io(#[from] std::io::Error),

    #[error("parsing schedule: {0}")]
    Json(#[from] serde_json::Error),
}

/// Tasks ordered by start time. Tasks with equal start times keep insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schedule {
    tasks: Vec<Task>,
}

impl Schedule {
    pub fn new(tasks: impl IntoIterator<Item = Task>) -> Self {
        let mut tasks = tasks.into_iter().collect::<Vec<_>>();
        tasks.sort_by_key(|t| t.start);

        Schedule {
            tasks,
        }
    }

    /// Parse a JSON array of tasks.
    pub fn from_json(s: &str) -> Result<Self, Error> {
        let tasks: Vec<Task> = serde_json::from_str(s)?;
        Ok(Self::new(tasks))
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let contents = tokio::fs::read_to_string(path).await?;
        Self::from_json(&contents)
    }

    pub fn push(&mut self, task: Task) {
        let idx = self.tasks.partition_point(|t| t.start <= task.start);
        self.tasks.insert(idx, task);
    }

    #[inline]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl IntoIterator for Schedule {
    type IntoIter = std::vec::IntoIter<Task>;
    type Item = Task;

    fn into_iter(self) -> Self::IntoIter {
        self.tasks.into_iter()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub completed: usize,
    pub failed:    usize,
}

/// Execute every task in order.
///
/// Each task is pointed `lead` ahead of its start; tasks whose lead time has passed are pointed
/// immediately. A task whose pointing command fails is skipped and the schedule goes on.
pub async fn run<R, W>(session: &Session<R, W>, schedule: Schedule, lead: Duration) -> Summary
where
    R: Stream<Item = Result<Packet, codec::Error>> + Unpin,
    W: Sink<Packet, Error = codec::Error> + Unpin,
{
    let mut summary = Summary::default();

    for task in schedule {
        let span = tracing::info_span!("task", title = %task.title);

        let result = async {
            sleep_until(task.point_at(lead)).await;

            session.point(task.orientation()).await?;
            tracing::info!(orientation = %task.orientation(), "pointed");

            sleep_until(task.start).await;
            tracing::info!(duration_ms = task.duration_ms, "task window open");

            tokio::time::sleep(task.duration()).await;
            tracing::info!("task window closed");

            Ok(()) as Result<(), crate::session::Error>
        }
        .instrument(span.clone())
        .await;

        let _guard = span.enter();
        crate::trace_catch!(result, "task failed");

        match result {
            Ok(()) => summary.completed += 1,
            Err(_) => summary.failed += 1,
        }
    }

    tracing::info!(completed = summary.completed, failed = summary.failed, "schedule finished");

    summary
}

async fn sleep_until(at: DateTime<Utc>) {
    if let Ok(wait) = (at - Utc::now()).to_std() {
        tokio::time::sleep(wait).await;
    }
}

#[cfg(test)]
mod test {
    use chrono::TimeZone;
    use proptest::prelude::*;

    use super::*;

    fn task(title: &str, start: DateTime<Utc>) -> Task {
        Task {
            title: title.to_owned(),
            start,
            duration_ms: 0,
            azimuth: 180.0,
            elevation: 30.0,
        }
    }

    #[test]
    fn test_orders_by_start() {
        let t0 = Utc.with_ymd_and_hms(2014, 4, 1, 12, 0, 0).unwrap();

        let mut schedule = Schedule::new([
            task("late", t0 + chrono::Duration::minutes(5)),
            task("early", t0),
            task("middle", t0 + chrono::Duration::minutes(1)),
        ]);
        schedule.push(task("also early", t0));

        let titles = schedule.tasks().iter().map(|t| t.title.as_str()).collect::<Vec<_>>();
        assert_eq!(titles, ["early", "also early", "middle", "late"]);
    }

    #[test]
    fn test_from_json() -> eyre::Result<()> {
        let schedule = Schedule::from_json(
            r#"[
                {"title": "b", "start": "2014-04-01T12:00:10Z", "duration_ms": 500, "azimuth": 1.0, "elevation": 2.0},
                {"title": "a", "start": "2014-04-01T12:00:00Z", "duration_ms": 250, "azimuth": 3.0, "elevation": 4.0}
            ]"#,
        )?;

        assert_eq!(schedule.len(), 2);

        let first = &schedule.tasks()[0];
        assert_eq!(first.title, "a");
        assert_eq!(first.duration(), Duration::from_millis(250));
        assert_eq!(first.orientation(), Orientation::new(3.0, 4.0));

        Ok(())
    }

    #[test]
    fn test_bad_json() {
        assert!(matches!(Schedule::from_json("[{\"title\": 1}]"), Err(Error::Json(_))));
    }

    #[test]
    fn test_point_at() {
        let t0 = Utc.with_ymd_and_hms(2014, 4, 1, 12, 0, 0).unwrap();

        assert_eq!(task("x", t0).point_at(DEFAULT_MOTOR_LEAD), t0 - chrono::Duration::seconds(5));
    }

    #[test]
    fn test_point_at_out_of_range() {
        let t0 = Utc.with_ymd_and_hms(2014, 4, 1, 12, 0, 0).unwrap();

        let lead = Duration::from_millis(9_000_000_000_000_000);
        assert_eq!(task("x", t0).point_at(lead), DateTime::<Utc>::MIN_UTC);
        assert_eq!(task("x", t0).point_at(Duration::MAX), DateTime::<Utc>::MIN_UTC);
    }

    #[test]
    fn test_display() {
        let t0 = Utc.with_ymd_and_hms(2014, 4, 1, 12, 30, 5).unwrap();

        assert_eq!(
            task("iss", t0).to_string(),
            "Title: iss\nDate: 01/04/2014\nTime: 12:30:05\nDuration: 0 ms\nAzimuth: 180 \
             degrees\nElevation: 30 degrees"
        );
    }

    proptest! {
        #[test]
        fn test_push_keeps_order(offsets in prop::collection::vec(-3600i64..3600, 0..32)) {
            let t0 = Utc.with_ymd_and_hms(2014, 4, 1, 12, 0, 0).unwrap();

            let mut schedule = Schedule::default();
            for (i, offset) in offsets.iter().enumerate() {
                schedule.push(task(&i.to_string(), t0 + chrono::Duration::seconds(*offset)));
            }

            prop_assert_eq!(schedule.len(), offsets.len());
            prop_assert!(schedule.tasks().windows(2).all(|w| w[0].start <= w[1].start));
            prop_assert_eq!(&schedule, &Schedule::new(schedule.tasks().to_vec()));
        }
    }
}
