//! Rendering backend lifecycle tests
//!
//! A recording backend wraps the software rasterizer to check that the
//! render target is always released, and can inject failures.

mod common;

use std::cell::RefCell;
use std::fs;
use std::rc::Rc;

use common::write_box_stl;
use stl2vox::{
    CpuRasterizer, DriverState, Error, LayerConfig, OrthoView, PreviewSession, RenderBackend,
    Result, Triangle, Voxelizer, VoxelizerConfig,
};

#[derive(Debug, Default)]
struct Log {
    allocations: usize,
    releases: usize,
    draws: usize,
}

struct RecordingBackend {
    inner: CpuRasterizer,
    log: Rc<RefCell<Log>>,
    fail_on_draw: Option<usize>,
    fail_allocate: bool,
}

impl RecordingBackend {
    fn new(log: &Rc<RefCell<Log>>) -> Self {
        Self {
            inner: CpuRasterizer::new(),
            log: Rc::clone(log),
            fail_on_draw: None,
            fail_allocate: false,
        }
    }
}

impl RenderBackend for RecordingBackend {
    fn allocate(&mut self, width: usize, height: usize) -> Result<()> {
        if self.fail_allocate {
            return Err(Error::backend("out of video memory"));
        }
        self.log.borrow_mut().allocations += 1;
        self.inner.allocate(width, height)
    }

    fn clear(&mut self) -> Result<()> {
        self.inner.clear()
    }

    fn draw(&mut self, triangles: &[Triangle], view: &OrthoView, channel: f32) -> Result<()> {
        let draws = {
            let mut log = self.log.borrow_mut();
            log.draws += 1;
            log.draws
        };
        if self.fail_on_draw == Some(draws) {
            return Err(Error::backend("device lost"));
        }
        self.inner.draw(triangles, view, channel)
    }

    fn read_channel(&self, out: &mut [u8]) -> Result<()> {
        self.inner.read_channel(out)
    }

    fn release(&mut self) {
        self.log.borrow_mut().releases += 1;
        self.inner.release();
    }
}

fn cube_config(dir: &std::path::Path) -> VoxelizerConfig {
    let cube = write_box_stl(dir, "cube.stl", [0.0; 3], [2.0; 3]);
    VoxelizerConfig::new(2, 2, 4)
        .with_layer(LayerConfig::new(cube, 3))
        .with_output_path(dir.join("out.ui8"))
}

#[test]
fn test_target_released_after_success() {
    let dir = tempfile::tempdir().unwrap();
    let log = Rc::new(RefCell::new(Log::default()));

    let mut voxelizer = Voxelizer::with_backend(cube_config(dir.path()), RecordingBackend::new(&log));
    voxelizer.run().unwrap();

    assert_eq!(voxelizer.state(), DriverState::Done);
    let log = log.borrow();
    assert_eq!(log.allocations, 1);
    assert_eq!(log.releases, 1);
    assert_eq!(log.draws, 4);
}

#[test]
fn test_target_released_after_slicing_failure() {
    let dir = tempfile::tempdir().unwrap();
    let log = Rc::new(RefCell::new(Log::default()));
    let mut backend = RecordingBackend::new(&log);
    backend.fail_on_draw = Some(3);

    let config = cube_config(dir.path());
    let output = config.output_path().to_path_buf();
    let mut voxelizer = Voxelizer::with_backend(config, backend);

    let err = voxelizer.run().unwrap_err();
    assert!(matches!(err, Error::Backend(_)));
    assert_eq!(voxelizer.state(), DriverState::Failed);
    assert_eq!(log.borrow().releases, 1);

    // The two completed slices stay on disk
    assert_eq!(fs::read(output).unwrap(), vec![3, 3, 3, 3, 3, 3, 3, 3]);
}

#[test]
fn test_allocation_failure_creates_no_output() {
    let dir = tempfile::tempdir().unwrap();
    let log = Rc::new(RefCell::new(Log::default()));
    let mut backend = RecordingBackend::new(&log);
    backend.fail_allocate = true;

    let config = cube_config(dir.path());
    let output = config.output_path().to_path_buf();
    let mut voxelizer = Voxelizer::with_backend(config, backend);

    assert!(matches!(voxelizer.run(), Err(Error::Backend(_))));
    assert_eq!(voxelizer.state(), DriverState::Failed);
    assert!(!output.exists());
}

#[test]
fn test_config_failure_never_touches_backend() {
    let log = Rc::new(RefCell::new(Log::default()));
    let mut voxelizer = Voxelizer::with_backend(
        VoxelizerConfig::new(2, 2, 2).with_layer(LayerConfig::new("x.stl", 0)),
        RecordingBackend::new(&log),
    );

    assert!(matches!(voxelizer.run(), Err(Error::Config(_))));
    assert_eq!(log.borrow().allocations, 0);
}

#[test]
fn test_preview_session_releases_on_drop() {
    let dir = tempfile::tempdir().unwrap();
    let log = Rc::new(RefCell::new(Log::default()));
    let scene = stl2vox::load_scene(&cube_config(dir.path())).unwrap();

    {
        let mut session = PreviewSession::with_backend(scene, RecordingBackend::new(&log)).unwrap();
        assert_eq!(session.current().unwrap().as_bytes(), &[3, 3, 3, 3]);
        assert!(session.scroll(3).unwrap().is_empty());
        assert_eq!(log.borrow().releases, 0);
    }

    assert_eq!(log.borrow().allocations, 1);
    assert_eq!(log.borrow().releases, 1);
}
