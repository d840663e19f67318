//! Background conversion worker.
//!
//! Runs one conversion at a time on a dedicated thread and reports progress
//! over a channel, so an interactive front end never blocks on decoding.

use crate::error::{Result, StitchError};
use crate::external::CancelToken;
use crate::pipeline::{ConversionReport, ConversionRequest, SkyboxConverter};
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

/// Status messages from a running conversion.
#[derive(Debug)]
pub enum WorkerEvent {
    Started,
    Log(String),
    Finished(Result<ConversionReport>),
}

/// Owns the single in-flight conversion of one tool instance.
pub struct ConversionWorker {
    converter: SkyboxConverter,
    busy: Arc<AtomicBool>,
    cancel: CancelToken,
    handle: Option<JoinHandle<()>>,
}

impl ConversionWorker {
    pub fn new(converter: SkyboxConverter) -> Self {
        Self {
            converter,
            busy: Arc::new(AtomicBool::new(false)),
            cancel: CancelToken::new(),
            handle: None,
        }
    }

    /// Check if a conversion is running.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Start a conversion. Fails with [`StitchError::Busy`] while one is running.
    pub fn start(&mut self, request: ConversionRequest) -> Result<Receiver<WorkerEvent>> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(StitchError::Busy);
        }

        // Reap the previous thread; it has already cleared the busy flag.
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }

        let (tx, rx) = unbounded();
        let converter = self.converter.clone();
        let busy = Arc::clone(&self.busy);
        let cancel = CancelToken::new();
        self.cancel = cancel.clone();

        let spawned = std::thread::Builder::new()
            .name("skybox-conversion".to_string())
            .spawn(move || run(converter, request, cancel, busy, tx));

        match spawned {
            Ok(handle) => {
                self.handle = Some(handle);
                Ok(rx)
            }
            Err(e) => {
                self.busy.store(false, Ordering::SeqCst);
                Err(StitchError::Io(e))
            }
        }
    }

    /// Abandon the running conversion; in-flight decoder processes are killed.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for the worker thread to exit.
    pub fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for ConversionWorker {
    fn drop(&mut self) {
        self.cancel();
        self.join();
    }
}

fn run(
    converter: SkyboxConverter,
    request: ConversionRequest,
    cancel: CancelToken,
    busy: Arc<AtomicBool>,
    tx: Sender<WorkerEvent>,
) {
    // A dropped receiver just means nobody is listening any more.
    let _ = tx.send(WorkerEvent::Started);
    let _ = tx.send(WorkerEvent::Log("Starting skybox conversion...".to_string()));

    let result = panic::catch_unwind(AssertUnwindSafe(|| converter.convert(&request, &cancel)))
        .unwrap_or_else(|payload| Err(StitchError::Internal(panic_message(payload))));
    match &result {
        Ok(report) => {
            let _ = tx.send(WorkerEvent::Log(format!(
                "[OK] Skybox saved to {} ({}x{})",
                report.atlas_path.display(),
                report.width,
                report.height
            )));
            for sidecar in &report.sidecars {
                let _ = tx.send(WorkerEvent::Log(format!("[OK] Created {}", sidecar.display())));
            }
            for warning in &report.warnings {
                let _ = tx.send(WorkerEvent::Log(format!("Warning: {}", warning)));
            }
        }
        Err(e) => {
            log::error!("Conversion failed: {}", e);
            let _ = tx.send(WorkerEvent::Log(format!("Error during conversion: {}", e)));
            if let Some(hint) = e.hint() {
                let _ = tx.send(WorkerEvent::Log(hint));
            }
        }
    }

    busy.store(false, Ordering::SeqCst);
    let _ = tx.send(WorkerEvent::Finished(result));
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "worker thread panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::pipeline::{FaceInput, OutputTarget};
    use crate::external::TextureDecoder;
    use image::{Rgba, RgbaImage};
    use std::path::Path;
    use std::time::Duration;

    fn write_faces(dir: &Path) {
        for (i, suffix) in ["up", "dn", "lf", "rt", "ft", "bk"].iter().enumerate() {
            let img = RgbaImage::from_pixel(8, 8, Rgba([i as u8 * 40, 0, 0, 255]));
            img.save(dir.join(format!("sky_{}.png", suffix))).unwrap();
        }
    }

    fn drain(rx: &Receiver<WorkerEvent>) -> (Vec<String>, Result<ConversionReport>) {
        let mut logs = Vec::new();
        loop {
            match rx.recv_timeout(Duration::from_secs(30)).unwrap() {
                WorkerEvent::Started => {}
                WorkerEvent::Log(line) => logs.push(line),
                WorkerEvent::Finished(result) => return (logs, result),
            }
        }
    }

    #[test]
    fn test_worker_runs_conversion() {
        let dir = tempfile::tempdir().unwrap();
        write_faces(dir.path());
        let out = dir.path().join("out").join("cross.png");

        let mut worker = ConversionWorker::new(SkyboxConverter::default());
        let request = ConversionRequest::new(
            FaceInput::Folder(dir.path().to_path_buf()),
            OutputTarget::File(out.clone()),
        );
        let rx = worker.start(request).unwrap();
        let (logs, result) = drain(&rx);

        let report = result.unwrap();
        assert_eq!((report.width, report.height), (32, 24));
        assert!(out.exists());
        assert!(logs.iter().any(|l| l.starts_with("[OK] Skybox saved")));
        assert!(!worker.is_busy());
        worker.join();
    }

    #[test]
    fn test_worker_reports_failure_and_frees_slot() {
        let dir = tempfile::tempdir().unwrap();
        let mut worker = ConversionWorker::new(SkyboxConverter::default());
        let request = ConversionRequest::new(
            FaceInput::Folder(dir.path().to_path_buf()),
            OutputTarget::File(dir.path().join("cross.png")),
        );

        let rx = worker.start(request.clone()).unwrap();
        let (logs, result) = drain(&rx);
        assert_eq!(result.unwrap_err().kind(), ErrorKind::IncompleteFaceSet);
        assert!(logs.iter().any(|l| l.starts_with("Error during conversion")));

        // The slot is free again once Finished has been delivered.
        let rx = worker.start(request).unwrap();
        let (_, result) = drain(&rx);
        assert!(result.is_err());
    }

    #[test]
    fn test_second_start_while_busy_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut worker = ConversionWorker::new(SkyboxConverter::default());
        worker.busy.store(true, Ordering::SeqCst);

        let request = ConversionRequest::new(
            FaceInput::Folder(dir.path().to_path_buf()),
            OutputTarget::File(dir.path().join("cross.png")),
        );
        let err = worker.start(request).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Busy);

        worker.busy.store(false, Ordering::SeqCst);
    }

    /// Replace the back face with a VTF so the decoder is consulted.
    fn write_faces_with_vtf(dir: &Path) {
        write_faces(dir);
        std::fs::remove_file(dir.join("sky_bk.png")).unwrap();
        std::fs::write(dir.join("sky_bk.vtf"), b"VTF\0fake").unwrap();
    }

    struct PanickingDecoder;

    impl TextureDecoder for PanickingDecoder {
        fn name(&self) -> &str {
            "panicking"
        }

        fn check_available(&self) -> Result<()> {
            Ok(())
        }

        fn decode(&self, _: &Path, _: &[u8], _: &CancelToken) -> Result<RgbaImage> {
            panic!("decoder blew up");
        }
    }

    /// Blocks until the run is cancelled.
    struct BlockingDecoder {
        started: Sender<()>,
    }

    impl TextureDecoder for BlockingDecoder {
        fn name(&self) -> &str {
            "blocking"
        }

        fn check_available(&self) -> Result<()> {
            Ok(())
        }

        fn decode(&self, _: &Path, _: &[u8], cancel: &CancelToken) -> Result<RgbaImage> {
            let _ = self.started.send(());
            while !cancel.is_cancelled() {
                std::thread::sleep(Duration::from_millis(10));
            }
            Err(StitchError::Cancelled)
        }
    }

    #[test]
    fn test_panicking_run_releases_worker() {
        let dir = tempfile::tempdir().unwrap();
        write_faces_with_vtf(dir.path());
        let converter = SkyboxConverter::default().with_decoder(Arc::new(PanickingDecoder));
        let mut worker = ConversionWorker::new(converter);
        let request = ConversionRequest::new(
            FaceInput::Folder(dir.path().to_path_buf()),
            OutputTarget::File(dir.path().join("out").join("cross.png")),
        );

        let rx = worker.start(request.clone()).unwrap();
        let (_, result) = drain(&rx);
        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(err.to_string().contains("decoder blew up"));
        assert!(!worker.is_busy());

        let rx = worker.start(request).unwrap();
        let (_, result) = drain(&rx);
        assert_eq!(result.unwrap_err().kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_cancel_in_flight_run() {
        let dir = tempfile::tempdir().unwrap();
        write_faces_with_vtf(dir.path());
        let out_dir = dir.path().join("out");
        std::fs::create_dir(&out_dir).unwrap();

        let (started_tx, started_rx) = unbounded();
        let converter = SkyboxConverter::default().with_decoder(Arc::new(BlockingDecoder {
            started: started_tx,
        }));
        let mut worker = ConversionWorker::new(converter);
        let request = ConversionRequest::new(
            FaceInput::Folder(dir.path().to_path_buf()),
            OutputTarget::File(out_dir.join("cross.png")),
        )
        .with_materials(true, true);

        let rx = worker.start(request).unwrap();
        started_rx.recv_timeout(Duration::from_secs(30)).unwrap();
        assert!(worker.is_busy());
        worker.cancel();

        let (_, result) = drain(&rx);
        assert_eq!(result.unwrap_err().kind(), ErrorKind::Cancelled);
        assert!(!worker.is_busy());
        assert_eq!(std::fs::read_dir(&out_dir).unwrap().count(), 0);
    }
}
