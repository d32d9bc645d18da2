//! Live countdown board
//!
//! Keeps one countdown per live job and redraws the board whenever a
//! countdown string changes. Jobs are refetched periodically; the previous
//! board's timers stop when it is replaced.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use jobdeck_client::SchedulerClient;
use futures::future::select_all;
use jobdeck_core::countdown::CountdownTimer;
use jobdeck_core::domain::job::Job;
use jobdeck_core::time::{Clock, SystemClock};
use jobdeck_core::view::{JobFilter, SortOrder, sort_scheduled};
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, warn};

use super::job::{FilterArgs, colorize_status, format_local};

#[derive(Args, Debug)]
pub struct WatchArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Seconds between job refetches
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
    pub refresh: u64,
}

struct Row {
    job: Job,
    countdown: Option<CountdownTimer>,
}

/// Live jobs with their running countdowns
struct Board {
    rows: Vec<Row>,
    /// One per countdown that has not finished yet
    updates: Vec<watch::Receiver<String>>,
}

impl Board {
    fn new(rows: Vec<Row>) -> Self {
        let updates = rows
            .iter()
            .filter_map(|row| row.countdown.as_ref().map(CountdownTimer::subscribe))
            .collect();
        Self { rows, updates }
    }

    async fn load(
        client: &SchedulerClient,
        filter: &JobFilter,
        clock: &Arc<dyn Clock>,
    ) -> Result<Self> {
        let jobs = client.list_jobs().await.context("Failed to fetch jobs")?;

        let mut shown = filter.apply(&jobs);
        sort_scheduled(&mut shown, SortOrder::Ascending);

        let rows = shown
            .into_iter()
            .map(|job| Row {
                countdown: job
                    .countdown_target()
                    .map(|target| CountdownTimer::spawn(target, Arc::clone(clock))),
                job: job.clone(),
            })
            .collect::<Vec<_>>();

        debug!(jobs = rows.len(), "board loaded");
        Ok(Self::new(rows))
    }

    /// Resolves when any countdown publishes a new string
    ///
    /// Finished countdowns are dropped from the set; with none left this
    /// never resolves.
    async fn changed(&mut self) {
        loop {
            if self.updates.is_empty() {
                return std::future::pending().await;
            }

            let (result, index, _) =
                select_all(self.updates.iter_mut().map(|rx| Box::pin(rx.changed()))).await;
            match result {
                Ok(()) => return,
                Err(_) => {
                    self.updates.swap_remove(index);
                }
            }
        }
    }

    fn render(&self) -> Vec<String> {
        self.rows
            .iter()
            .map(|row| {
                let job = &row.job;
                let countdown = match (&row.countdown, job.next_run_time) {
                    (Some(timer), Some(target)) => {
                        format!("{:>12}  {}", timer.current(), format_local(target).dimmed())
                    }
                    _ => format!("{:>12}", "-"),
                };
                format!(
                    "  {:<24} {:<10} {:<24} {}",
                    job.display_name(),
                    job.trigger.kind().label(),
                    colorize_status(&job.status),
                    countdown
                )
            })
            .collect()
    }
}

/// Watch live countdowns until interrupted
pub async fn watch_jobs(client: &SchedulerClient, args: WatchArgs) -> Result<()> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let filter = args.filter.to_filter();
    let refresh = Duration::from_secs(args.refresh);

    let mut board = Board::load(client, &filter, &clock).await?;

    let mut refetch = interval_at(Instant::now() + refresh, refresh);
    refetch.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut last_frame = board.render();
    draw(&last_frame)?;

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            _ = refetch.tick() => {
                let loaded = tokio::select! {
                    _ = &mut ctrl_c => break,
                    loaded = Board::load(client, &filter, &clock) => loaded,
                };
                match loaded {
                    Ok(next) => {
                        board = next;
                        last_frame = board.render();
                        draw(&last_frame)?;
                    }
                    Err(e) => warn!(error = %format!("{:#}", e), "refresh failed, keeping previous jobs"),
                }
            }
            _ = board.changed() => {
                let frame = board.render();
                if frame != last_frame {
                    draw(&frame)?;
                    last_frame = frame;
                }
            }
        }
    }

    println!();
    Ok(())
}

fn draw(frame: &[String]) -> Result<()> {
    let mut out = std::io::stdout().lock();

    // Clear screen, cursor home
    write!(out, "\x1B[2J\x1B[H")?;
    writeln!(out, "{}", "Live jobs (Ctrl-C to quit)".bold())?;
    writeln!(out)?;

    if frame.is_empty() {
        writeln!(out, "{}", "No jobs found.".yellow())?;
    }
    for line in frame {
        writeln!(out, "{}", line)?;
    }

    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use jobdeck_core::domain::job::{
        HttpMethod, HttpRequest, JobStatus, OneTimeFields, Trigger,
    };
    use tokio::time::timeout;

    fn paused_job() -> Job {
        Job {
            id: "p1".to_string(),
            name: Some("nightly".to_string()),
            status: JobStatus::Paused,
            trigger: Trigger::OneTime(OneTimeFields { date: None }),
            next_run_time: None,
            request: HttpRequest {
                url: "https://x.test".to_string(),
                method: HttpMethod::Get,
                headers: None,
                body: None,
            },
            result: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_job_without_next_run_has_no_countdown() {
        let board = Board::new(vec![Row {
            job: paused_job(),
            countdown: None,
        }]);

        let frame = board.render();
        assert_eq!(frame.len(), 1);
        assert!(frame[0].contains("nightly"));
        assert!(frame[0].contains("One Time"));
        assert!(frame[0].trim_end().ends_with('-'));
    }

    fn board_counting_down_to(target: chrono::DateTime<Utc>) -> Board {
        Board::new(vec![Row {
            job: paused_job(),
            countdown: Some(CountdownTimer::spawn(target, Arc::new(SystemClock))),
        }])
    }

    #[tokio::test(start_paused = true)]
    async fn test_board_without_countdowns_never_changes() {
        let mut board = Board::new(vec![Row {
            job: paused_job(),
            countdown: None,
        }]);

        assert!(
            timeout(Duration::from_secs(60), board.changed())
                .await
                .is_err()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_board_wakes_on_countdown_tick() {
        let mut board = board_counting_down_to(Utc::now() + chrono::Duration::seconds(30));

        assert!(
            timeout(Duration::from_secs(2), board.changed())
                .await
                .is_ok()
        );
        assert_eq!(board.updates.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_finished_countdown_stops_waking_board() {
        let mut board = board_counting_down_to(Utc::now() - chrono::Duration::seconds(1));

        // Final "< 1s" frame, then the timer closes its channel
        assert!(
            timeout(Duration::from_secs(2), board.changed())
                .await
                .is_ok()
        );
        assert!(
            timeout(Duration::from_secs(60), board.changed())
                .await
                .is_err()
        );
        assert!(board.updates.is_empty());
    }
}
