use crate::controller::{Controller, RunReport};
use crate::record::GifRecorder;
use crate::schedule::{Clock, Job, SystemClock, TaskQueue};
use crate::settings::Settings;
use crate::surface::PixelSurface;
use std::error::Error;
use std::path::PathBuf;

/// Options for a run without a terminal
#[derive(Debug, Clone)]
pub struct HeadlessOptions {
    pub width: u32,
    pub height: u32,
    pub snapshot: Option<PathBuf>,
    pub record: Option<PathBuf>,
    pub frame_every: usize,
}

impl Default for HeadlessOptions {
    fn default() -> Self {
        Self {
            width: 400,
            height: 400,
            snapshot: None,
            record: None,
            frame_every: 1,
        }
    }
}

/// Run to stability on an in-memory surface.
///
/// Timers are fired in deadline order without sleeping: the queue's clock jumps
/// straight to the next deadline, so timed runs finish as fast as fast-forward ones
/// while still producing one render per step for the recording.
pub fn run(settings: Settings, options: &HeadlessOptions) -> Result<RunReport, Box<dyn Error>> {
    let mut surface = PixelSurface::new(options.width, options.height);
    let mut controller = Controller::new(settings.clone(), &mut surface)?;
    let mut queue = TaskQueue::new(SystemClock.now());
    let mut recorder = options
        .record
        .as_deref()
        .map(|path| {
            GifRecorder::create(
                path,
                (options.width, options.height),
                settings.step_delay(),
                options.frame_every,
            )
        })
        .transpose()?;

    if let Some(rec) = recorder.as_mut() {
        rec.write_frame(&surface)?;
    }

    controller.start(&mut queue, &mut surface)?;
    while !queue.is_idle() {
        for job in queue.take_paint_jobs() {
            controller.run_job(job, &mut queue, &mut surface);
            if let (Job::Render, Some(rec)) = (job, recorder.as_mut()) {
                rec.offer(&surface)?;
            }
        }
        if let Some(due) = queue.next_due() {
            queue.advance_to(due);
            for job in queue.drain_due() {
                controller.run_job(job, &mut queue, &mut surface);
            }
        }
    }

    controller.render(&mut surface);
    if let Some(mut rec) = recorder {
        rec.write_frame(&surface)?;
        rec.finish()?;
    }
    if let Some(path) = &options.snapshot {
        surface.save_png(path)?;
    }

    controller
        .last_report()
        .ok_or_else(|| "simulation ended without a report".into())
}
