//! Background task that applies namespace switches.
//!
//! Drains the switch stream in order, runs each notice through the
//! [`GrabArbiter`], and answers the notice's completion.  The task ends when
//! every sink has been dropped.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::application::grab_arbiter::GrabArbiter;
use crate::domain::switch::SwitchStream;

pub fn spawn_switch_handler(arbiter: Arc<GrabArbiter>, mut stream: SwitchStream) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("switch handler started");
        while let Some(notice) = stream.recv().await {
            debug!(namespace = %notice.namespace, kind = %notice.kind, "switch notice received");
            // Grab transitions only take short parking_lot locks; no need to
            // move them off the runtime.
            let report = arbiter.handle_switch(notice.namespace, notice.kind);
            notice.complete(report);
        }
        info!("switch handler stopped");
    })
}
