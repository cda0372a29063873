//! Async repair driver
//!
//! Hosts that forward document mutations over a channel get the same
//! trailing-edge scheduling as [`crate::TableModule::poll_repair`], with
//! the wait handled by the tokio timer.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use tessera_core::{Document, Mutation};
use tessera_table::{rebalance_all, RepairReport};
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info};

use crate::debounce::Debouncer;
use crate::error::Result;
use crate::module::triggers_repair;

/// Consume mutation notifications until the sender closes, rebalancing every
/// table once no table mutation arrived for `delay`
///
/// A pass still pending when the channel closes runs before returning. The
/// returned report sums every pass.
pub async fn run_repair_loop(
    doc: Rc<RefCell<Document>>,
    mut mutations: mpsc::UnboundedReceiver<Mutation>,
    delay: Duration,
) -> Result<RepairReport> {
    let mut debouncer = Debouncer::new(delay);
    let mut total = RepairReport::default();
    loop {
        let deadline = debouncer.deadline();
        tokio::select! {
            received = mutations.recv() => match received {
                Some(mutation) => {
                    if triggers_repair(mutation.tag) {
                        debouncer.trigger(Instant::now().into_std());
                    }
                }
                None => {
                    if debouncer.is_pending() {
                        total.absorb(repair_pass(&doc)?);
                    }
                    break;
                }
            },
            _ = sleep_until_optional(deadline) => {
                debouncer.cancel();
                total.absorb(repair_pass(&doc)?);
            }
        }
    }
    debug!("Repair loop stopped");
    Ok(total)
}

/// Sleep until a deadline, or wait forever if None
async fn sleep_until_optional(deadline: Option<std::time::Instant>) {
    match deadline {
        Some(deadline) => sleep_until(Instant::from_std(deadline)).await,
        None => std::future::pending::<()>().await,
    }
}

fn repair_pass(doc: &RefCell<Document>) -> Result<RepairReport> {
    let mut doc = doc.borrow_mut();
    let report = rebalance_all(&mut doc)?;
    doc.take_mutations();
    if !report.is_noop() {
        info!("Table repair pass: {:?}", report);
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::{NodeId, Tag};
    use tessera_table::{check, insert_table, Grid, TableConfig};
    use tokio::task::{spawn_local, LocalSet};
    use tokio::time::sleep;

    /// A 2x2 table with one cell deleted behind the engine's back, and the
    /// notifications that deletion produced
    fn damaged() -> (Rc<RefCell<Document>>, NodeId, Vec<Mutation>) {
        let mut doc = Document::default();
        let table = insert_table(&mut doc, 0, 2, 2, &TableConfig::default())
            .unwrap()
            .table;
        doc.take_mutations();
        let victim = Grid::build(&doc, table).unwrap().cell_at(1, 0).unwrap();
        doc.remove(victim).unwrap();
        let pending = doc.take_mutations();
        (Rc::new(RefCell::new(doc)), table, pending)
    }

    fn is_consistent(doc: &Rc<RefCell<Document>>, table: NodeId) -> bool {
        check(&doc.borrow(), table).unwrap().is_empty()
    }

    #[tokio::test(start_paused = true)]
    async fn test_repair_waits_for_quiet_period() {
        let (doc, table, pending) = damaged();
        let (tx, rx) = mpsc::unbounded_channel();
        LocalSet::new()
            .run_until(async move {
                let handle = spawn_local(run_repair_loop(doc.clone(), rx, Duration::from_millis(100)));
                for mutation in pending {
                    tx.send(mutation).unwrap();
                }

                sleep(Duration::from_millis(50)).await;
                assert!(!is_consistent(&doc, table));
                sleep(Duration::from_millis(100)).await;
                assert!(is_consistent(&doc, table));

                drop(tx);
                let report = handle.await.unwrap().unwrap();
                assert_eq!(report.cells_inserted, 1);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_pass_runs_on_close() {
        let (doc, table, pending) = damaged();
        let (tx, rx) = mpsc::unbounded_channel();
        for mutation in pending {
            tx.send(mutation).unwrap();
        }
        drop(tx);

        let local = LocalSet::new();
        let report = local
            .run_until(run_repair_loop(doc.clone(), rx, Duration::from_secs(10)))
            .await
            .unwrap();
        assert_eq!(report.cells_inserted, 1);
        assert!(is_consistent(&doc, table));
    }

    #[tokio::test(start_paused = true)]
    async fn test_text_mutations_are_ignored() {
        let (doc, table, _) = damaged();
        let (tx, rx) = mpsc::unbounded_channel();
        let root = doc.borrow().root();
        LocalSet::new()
            .run_until(async move {
                let handle = spawn_local(run_repair_loop(doc.clone(), rx, Duration::from_millis(100)));
                tx.send(Mutation { target: root, tag: Tag::P }).unwrap();
                sleep(Duration::from_millis(500)).await;
                assert!(!is_consistent(&doc, table));

                drop(tx);
                let report = handle.await.unwrap().unwrap();
                assert!(report.is_noop());
            })
            .await;
    }
}
