//! Lifecycle shell around the demo catalogue.
//!
//! A [`DemoScreen`] plays the part of the screen that owns the catalogue: it runs
//! its configured demo every time it appears and releases every subscription the
//! demos started when it is torn down or dropped.

use std::{sync::Arc, time::Duration};

use crate::{
    demo::{Console, DemoCatalogue, DemoKind},
    scheduler::Scheduler,
};

/// What a [`DemoScreen`] shows and for how long.
#[derive(Clone, Debug)]
pub struct ScreenConfig {
    pub demo: DemoKind,
    /// How long `present` keeps the screen visible before tearing it down.
    pub run_for: Duration,
    /// Print demo output to stdout.
    pub echo: bool,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        ScreenConfig {
            demo: DemoKind::Driver,
            run_for: Duration::from_secs(5),
            echo: true,
        }
    }
}

pub struct DemoScreen {
    config: ScreenConfig,
    catalogue: DemoCatalogue,
    torn_down: bool,
}

impl DemoScreen {
    #[must_use]
    pub fn new(config: ScreenConfig, scheduler: Arc<dyn Scheduler>) -> Self {
        let console = if config.echo {
            Console::stdout()
        } else {
            Console::recording()
        };
        DemoScreen {
            catalogue: DemoCatalogue::new(scheduler, console),
            config,
            torn_down: false,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ScreenConfig {
        &self.config
    }

    #[must_use]
    pub fn console(&self) -> &Console {
        self.catalogue.console()
    }

    #[must_use]
    pub fn catalogue(&self) -> &DemoCatalogue {
        &self.catalogue
    }

    /// Runs the configured demo.
    pub fn did_appear(&mut self) {
        tracing::info!(demo = %self.config.demo, "screen appeared");
        self.catalogue.run(self.config.demo);
    }

    /// Releases every subscription the demos started. Calling it again does nothing.
    pub fn tear_down(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        tracing::info!(
            demo = %self.config.demo,
            subscriptions = self.catalogue.bag().len(),
            "tearing down screen"
        );
        self.catalogue.dispose();
    }

    /// Appear, stay visible for `run_for` and tear down.
    pub async fn present(&mut self) {
        self.did_appear();
        tokio::time::sleep(self.config.run_for).await;
        self.tear_down();
    }
}

impl Drop for DemoScreen {
    fn drop(&mut self) {
        self.tear_down();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::VirtualTimeScheduler;

    fn screen(demo: DemoKind, scheduler: &VirtualTimeScheduler) -> DemoScreen {
        DemoScreen::new(
            ScreenConfig {
                demo,
                run_for: Duration::ZERO,
                echo: false,
            },
            Arc::new(scheduler.clone()),
        )
    }

    #[test]
    fn tear_down_stops_running_demo() {
        let scheduler = VirtualTimeScheduler::new();
        let mut screen = screen(DemoKind::Interval, &scheduler);

        screen.did_appear();
        scheduler.advance_by(Duration::from_secs(2));
        screen.tear_down();
        scheduler.advance_by(Duration::from_secs(5));

        assert_eq!(screen.console().lines(), vec!["next(0)", "next(1)"]);
        assert_eq!(scheduler.pending(), 0);
        assert!(screen.catalogue().bag().is_disposed());
    }

    #[test]
    fn drop_releases_subscriptions() {
        let scheduler = VirtualTimeScheduler::new();
        let mut screen = screen(DemoKind::Timer, &scheduler);

        screen.did_appear();
        assert_eq!(scheduler.pending(), 1);
        drop(screen);

        assert_eq!(scheduler.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn present_runs_for_configured_time() {
        let scheduler = crate::TokioScheduler::try_current().expect("inside a runtime");
        let mut screen = DemoScreen::new(
            ScreenConfig {
                demo: DemoKind::Timer,
                run_for: Duration::from_secs(4),
                echo: false,
            },
            Arc::new(scheduler),
        );

        screen.present().await;

        assert_eq!(screen.console().lines(), vec!["next(0)", "completed"]);
    }
}
