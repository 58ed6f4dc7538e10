use std::io;
use std::path::Path;
use std::sync::Arc;

use anyhow::{
  Context,
  anyhow
};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{
  debug,
  info,
  instrument,
  warn
};

use crate::cli::Command;
use crate::clock::SystemClock;
use crate::config::Config;
use crate::desk::Desk;
use crate::focus::{
  FocusSettings,
  FocusSettingsPatch
};
use crate::render::Renderer;
use crate::scenario::Scenario;
use crate::task::TaskDraft;
use crate::ticker::FocusTicker;
use crate::views::View;

#[instrument(skip(cfg, renderer, command))]
pub fn dispatch(
  cfg: &Config,
  renderer: &mut Renderer,
  command: Command
) -> anyhow::Result<()> {
  debug!(?command, "dispatching command");

  match command {
    | Command::Replay {
      scenario,
      json
    } => cmd_replay(
      cfg, renderer, &scenario, json
    ),
    | Command::Focus {
      scenario,
      tasks,
      segments
    } => cmd_focus(
      cfg,
      renderer,
      scenario.as_deref(),
      &tasks,
      segments
    ),
    | Command::Settings {
      all
    } => cmd_settings(cfg, all),
    | Command::Version => {
      println!(
        "{}",
        env!("CARGO_PKG_VERSION")
      );
      Ok(())
    }
  }
}

fn configured_desk(
  cfg: &Config
) -> anyhow::Result<Desk> {
  let settings = cfg
    .focus_settings()
    .context(
      "invalid focus settings in \
       configuration"
    )?;
  let tz = cfg.timezone()?;
  let mut desk = Desk::new(Arc::new(
    SystemClock::new(tz)
  ));
  desk.set_focus_settings(
    settings_patch(settings)
  );
  Ok(desk)
}

fn settings_patch(
  settings: FocusSettings
) -> FocusSettingsPatch {
  FocusSettingsPatch {
    work_duration: Some(
      settings.work_duration
    ),
    break_duration: Some(
      settings.break_duration
    ),
    long_break_duration: Some(
      settings.long_break_duration
    ),
    sessions_until_long_break: Some(
      settings.sessions_until_long_break
    )
  }
}

#[instrument(skip(cfg, renderer))]
fn cmd_replay(
  cfg: &Config,
  renderer: &mut Renderer,
  path: &Path,
  json: bool
) -> anyhow::Result<()> {
  info!("command replay");

  let scenario = Scenario::load(path)?;
  let mut desk = configured_desk(cfg)?;
  scenario.apply(&mut desk)?;

  let snapshot = desk.store.snapshot();
  if json {
    let text = serde_json::to_string_pretty(
      snapshot.as_ref()
    )?;
    println!("{text}");
    return Ok(());
  }

  renderer.print_task_table(
    &snapshot,
    desk.clock().today()
  )?;
  if snapshot.focus.is_active {
    let title = snapshot
      .current_task()
      .map(|t| t.title.as_str());
    renderer.write_focus_status(
      io::stdout().lock(),
      &desk.timer,
      &snapshot.focus,
      title
    )?;
  }
  Ok(())
}

#[instrument(skip(
  cfg, renderer, titles
))]
fn cmd_focus(
  cfg: &Config,
  renderer: &mut Renderer,
  scenario: Option<&Path>,
  titles: &[String],
  segments: u32
) -> anyhow::Result<()> {
  info!("command focus");

  let mut desk = configured_desk(cfg)?;
  if let Some(path) = scenario {
    Scenario::load(path)?
      .apply(&mut desk)?;
  }
  for title in titles {
    let draft = TaskDraft::new(title.as_str());
    draft.validate()?;
    desk.store.add_task(draft);
  }
  desk.enter_focus(&View::All)?;

  let period = cfg.tick_period()?;
  let runtime =
    tokio::runtime::Builder::new_current_thread()
      .enable_time()
      .build()
      .context(
        "failed to build timer runtime"
      )?;

  let desk = Arc::new(Mutex::new(desk));
  runtime.block_on(run_focus_loop(
    Arc::clone(&desk),
    renderer,
    period,
    segments
  ))?;

  let desk = desk.lock();
  renderer.print_task_table(
    &desk.store.snapshot(),
    desk.clock().today()
  )
}

async fn run_focus_loop(
  desk: Arc<Mutex<Desk>>,
  renderer: &Renderer,
  period: std::time::Duration,
  segments: u32
) -> anyhow::Result<()> {
  let (tx, mut rx) =
    mpsc::unbounded_channel();
  let mut ticker = FocusTicker::new(
    Arc::clone(&desk),
    period,
    tx
  );
  if !ticker.start() {
    return Err(anyhow!(
      "focus timer could not start"
    ));
  }

  let mut display =
    tokio::time::interval(period);
  let mut expired = 0_u32;
  loop {
    tokio::select! {
      event = rx.recv() => {
        let Some(event) = event else {
          warn!("tick task went away");
          break;
        };
        renderer.write_event(io::stdout().lock(), &event)?;
        expired += 1;
        let active = desk.lock().store.focus().is_active;
        if expired >= segments || !active {
          info!(expired, "focus run finished");
          break;
        }
        ticker.start();
      }
      _ = display.tick() => {
        let guard = desk.lock();
        let snapshot = guard.store.snapshot();
        let title = snapshot
          .current_task()
          .map(|t| t.title.as_str());
        renderer.write_focus_status(
          io::stdout().lock(),
          &guard.timer,
          &snapshot.focus,
          title
        )?;
      }
    }
  }

  ticker.cancel();
  Ok(())
}

#[instrument(skip(cfg))]
fn cmd_settings(
  cfg: &Config,
  all: bool
) -> anyhow::Result<()> {
  let settings = cfg.focus_settings()?;
  println!(
    "work                      {} min",
    settings.work_duration
  );
  println!(
    "break                     {} min",
    settings.break_duration
  );
  println!(
    "long break                {} min",
    settings.long_break_duration
  );
  println!(
    "sessions until long break {}",
    settings.sessions_until_long_break
  );
  println!(
    "tick period               {} ms",
    cfg.tick_period()?.as_millis()
  );
  println!(
    "timezone                  {}",
    cfg.timezone()?
  );

  if all {
    let mut entries: Vec<_> =
      cfg.iter().collect();
    entries.sort();
    for (key, value) in entries {
      println!("{key}={value}");
    }
    for file in &cfg.loaded_files {
      println!(
        "# loaded {}",
        file.display()
      );
    }
  }
  Ok(())
}
