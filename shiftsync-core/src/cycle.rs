//! One stateless sync cycle.
//!
//! crawl → dedupe → export → reconcile → apply → notify. Nothing is kept
//! between cycles; what has been synced lives in the remote store.

use std::path::PathBuf;

use chrono::Local;

use crate::config::CycleConfig;
use crate::diff::{self, ApplyReport, DateChange, Reconciliation};
use crate::error::{ShiftSyncError, ShiftSyncResult};
use crate::exports::{prune_exports, write_export};
use crate::ics::generate_schedule_ics;
use crate::merge::canonicalize;
use crate::notify::Notifier;
use crate::page::PageSnapshot;
use crate::parse::{DetailPanelParser, GridParser, Page, ParseContext};
use crate::remote::RemoteStore;
use crate::render::Renderer;
use crate::shift::{ParsedCandidate, Shift};
use crate::sync_window::SyncWindow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    Apply,
    /// List and reconcile, but never mutate the store or notify
    DryRun,
}

/// Walk up to `max_pages` periods and collect candidates from each.
///
/// The grid chain runs first on every page; the detail panels are only
/// consulted for pages where it found nothing. A missing snapshot counts
/// as an empty page. Once a page has been read, a failed navigation or
/// snapshot ends the crawl with what was collected so far, and a failed
/// column-date lookup falls back to the page's own headers.
pub async fn crawl<R: Renderer>(
    renderer: &mut R,
    config: &CycleConfig,
) -> ShiftSyncResult<Vec<ParsedCandidate>> {
    let grid = GridParser::default();
    let panels = DetailPanelParser::new(config.max_panel_cells);
    let mut candidates = Vec::new();

    for page in 1..=config.max_pages {
        let cx = ParseContext::new(config.zone, &config.label, page);

        let markup = match renderer.snapshot().await {
            Ok(markup) => markup,
            Err(e) if page > 1 => {
                log::warn!("page {page}: snapshot failed, keeping earlier pages: {e}");
                break;
            }
            Err(e) => return Err(e),
        };

        match markup {
            Some(markup) => {
                let snapshot = PageSnapshot::parse(&markup);
                let live_columns = renderer.column_dates().await.unwrap_or_else(|e| {
                    log::warn!("page {page}: column dates unavailable: {e}");
                    None
                });
                let view = Page {
                    snapshot: &snapshot,
                    live_columns: live_columns.as_ref(),
                };

                match grid.parse(&view, &cx) {
                    Ok(outcome) => {
                        log::info!(
                            "page {page}: {} candidate(s) via {}",
                            outcome.candidates.len(),
                            outcome.strategy
                        );
                        candidates.extend(outcome.candidates);
                    }
                    Err(ShiftSyncError::EmptyParseResult { .. }) => {
                        match panels.parse(renderer, &snapshot, &cx).await {
                            Ok(found) => {
                                log::info!("page {page}: {} candidate(s) via detail panels", found.len());
                                candidates.extend(found);
                            }
                            Err(ShiftSyncError::EmptyParseResult { .. }) => {
                                log::info!("page {page}: no shifts found");
                            }
                            Err(e) => return Err(e),
                        }
                    }
                    Err(e) => return Err(e),
                }
            }
            None => log::info!("page {page}: renderer returned no snapshot"),
        }

        if page == config.max_pages {
            break;
        }
        match renderer.next_period().await {
            Ok(true) => {}
            Ok(false) => {
                log::debug!("page {page}: period did not change; stopping");
                break;
            }
            Err(e) => {
                log::warn!("page {page}: could not advance period: {e}");
                break;
            }
        }
    }

    Ok(candidates)
}

/// Outcome of the bounded scrape retries.
#[derive(Debug)]
pub struct ScrapeOutcome {
    pub shifts: Vec<Shift>,
    pub attempts: usize,
}

/// Crawl until some shift is found, up to `config.attempts` times. Each
/// attempt starts with a renderer reset; a failed attempt is logged and
/// retried after `config.retry_delay`.
pub async fn scrape<R: Renderer>(renderer: &mut R, config: &CycleConfig) -> ScrapeOutcome {
    for attempt in 1..=config.attempts {
        let result = match renderer.reset().await {
            Ok(()) => crawl(renderer, config).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(candidates) => {
                let shifts = canonicalize(candidates);
                if !shifts.is_empty() {
                    log::info!("attempt {attempt}: {} shift(s)", shifts.len());
                    return ScrapeOutcome {
                        shifts,
                        attempts: attempt,
                    };
                }
                log::warn!("attempt {attempt}/{}: no shifts parsed", config.attempts);
            }
            Err(e) => log::warn!("attempt {attempt}/{} failed: {e}", config.attempts),
        }

        if attempt < config.attempts && !config.retry_delay.is_zero() {
            tokio::time::sleep(config.retry_delay).await;
        }
    }

    ScrapeOutcome {
        shifts: Vec::new(),
        attempts: config.attempts,
    }
}

/// What the sync phase did.
#[derive(Debug)]
pub enum SyncOutcome {
    /// Nothing was parsed, so the store was not contacted
    Skipped,
    Planned {
        reconciliation: Reconciliation,
    },
    Applied {
        reconciliation: Reconciliation,
        report: ApplyReport,
    },
}

#[derive(Debug)]
pub struct CycleReport {
    pub shifts: Vec<Shift>,
    pub attempts: usize,
    pub export: Option<PathBuf>,
    pub pruned: usize,
    pub sync: SyncOutcome,
    /// Per-date changes: planned for a dry run, applied otherwise
    pub changes: Vec<DateChange>,
    pub notified: bool,
}

/// Reconcile `shifts` against the store and, in [`SyncMode::Apply`], apply
/// the result. An empty set never reaches the store.
pub async fn sync_shifts(
    config: &CycleConfig,
    shifts: &[Shift],
    store: &impl RemoteStore,
    mode: SyncMode,
) -> ShiftSyncResult<(SyncOutcome, Vec<DateChange>)> {
    let Some(window) = SyncWindow::from_shifts(shifts) else {
        log::warn!("no shifts parsed; skipping sync so nothing is deleted");
        return Ok((SyncOutcome::Skipped, Vec::new()));
    };

    let remote = store.list(&window, &config.label).await?;
    log::info!(
        "{} remote event(s) between {} and {}",
        remote.len(),
        window.from_rfc3339(),
        window.to_rfc3339()
    );

    let reconciliation =
        Reconciliation::compute(shifts, remote, window, &config.label, config.zone)?;

    match mode {
        SyncMode::DryRun => {
            let changes = reconciliation.changes();
            Ok((SyncOutcome::Planned { reconciliation }, changes))
        }
        SyncMode::Apply => {
            let report = diff::apply(&reconciliation, store).await;
            if report.failures() > 0 {
                log::warn!("{} remote operation(s) failed", report.failures());
            }
            let changes = report.changes(&reconciliation);
            Ok((
                SyncOutcome::Applied {
                    reconciliation,
                    report,
                },
                changes,
            ))
        }
    }
}

/// Run one full cycle.
///
/// Exports are written and pruned only when applying. The notifier only
/// hears about changes that were actually applied.
pub async fn run_cycle<R, S, N>(
    config: &CycleConfig,
    renderer: &mut R,
    store: &S,
    notifier: &N,
    mode: SyncMode,
) -> ShiftSyncResult<CycleReport>
where
    R: Renderer,
    S: RemoteStore,
    N: Notifier,
{
    let now = Local::now();
    let mut pruned = 0;
    let mut export = None;

    let export_dir = match mode {
        SyncMode::Apply => config.export_dir.as_deref(),
        SyncMode::DryRun => None,
    };

    if let Some(dir) = export_dir {
        match prune_exports(dir, config.retention_days, &now) {
            Ok(n) => pruned = n,
            Err(e) => log::warn!("export cleanup failed: {e}"),
        }
    }

    let ScrapeOutcome { shifts, attempts } = scrape(renderer, config).await;

    if let Some(dir) = export_dir.filter(|_| !shifts.is_empty()) {
        match write_export(dir, &now, &generate_schedule_ics(&shifts)) {
            Ok(path) => {
                log::info!("wrote {}", path.display());
                export = Some(path);
            }
            Err(e) => log::warn!("could not write export: {e}"),
        }
    }

    let (sync, changes) = sync_shifts(config, &shifts, store, mode).await?;

    let mut notified = false;
    if mode == SyncMode::Apply && !changes.is_empty() {
        let lines: Vec<String> = changes.iter().map(DateChange::line).collect();
        match notifier.notify(&lines).await {
            Ok(()) => notified = true,
            Err(e) => log::warn!("notification failed: {e}"),
        }
    }

    Ok(CycleReport {
        shifts,
        attempts,
        export,
        pruned,
        sync,
        changes,
        notified,
    })
}
