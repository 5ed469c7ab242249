use frame_sampler::source::TestPatternSource;
use frame_sampler::{ExportOutcome, FrameSampler};
use frame_sampler_common::config::{ConfigError, SamplerConfig, Schedule, SourceConfig};
use frame_sampler_common::frame::{Frame, PixelFormat};
use std::path::Path;

fn yuv_frame(seq: u64) -> Frame {
    let (w, h) = (16u32, 8u32);
    let len = PixelFormat::Yuv420p.buffer_len(w, h).unwrap();
    let data: Vec<u8> = (0..len).map(|i| (i as u64 * 7 + seq) as u8).collect();
    Frame::new(seq, w, h, PixelFormat::Yuv420p, 1708300000000 + seq as i64 * 40, data).unwrap()
}

fn jpegs_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|n| n.ends_with(".jpg"))
        .collect();
    names.sort();
    names
}

#[test]
fn five_frames_interval_two_exports_even_indices() {
    let dir = tempfile::tempdir().unwrap();
    let mut sampler = FrameSampler::jpeg(SamplerConfig::with_interval(2, dir.path())).unwrap();

    let mut forwarded = Vec::new();
    for seq in 0..5 {
        sampler.filter_frame(yuv_frame(seq), &mut forwarded).unwrap();
    }

    let seqs: Vec<u64> = forwarded.iter().map(Frame::seq).collect();
    assert_eq!(seqs, [0, 1, 2, 3, 4]);
    assert_eq!(
        jpegs_in(dir.path()),
        [
            "dumpframe-000000.jpg",
            "dumpframe-000002.jpg",
            "dumpframe-000004.jpg"
        ]
    );
    let stats = sampler.stats();
    assert_eq!((stats.frames, stats.attempted, stats.written), (5, 3, 3));
}

#[test]
fn forwarded_frames_are_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let mut sampler = FrameSampler::jpeg(SamplerConfig::with_interval(1, dir.path())).unwrap();
    for seq in 0..3 {
        let input = yuv_frame(seq);
        let output = sampler.process(input.clone());
        assert_eq!(output, input);
        assert!(output.shares_buffer(&input));
    }
}

#[test]
fn exported_jpeg_decodes_to_frame_size() {
    let dir = tempfile::tempdir().unwrap();
    let mut sampler = FrameSampler::jpeg(SamplerConfig::with_interval(1, dir.path())).unwrap();
    let frame = yuv_frame(0);
    let request = sampler.export_request(&frame, 0);
    let outcome = sampler.export(&request).unwrap();

    let ExportOutcome::Written { path, bytes } = outcome else {
        panic!("expected a written file");
    };
    assert_eq!(std::fs::metadata(&path).unwrap().len() as usize, bytes);
    let decoded = image::open(&path).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (16, 8));
}

#[test]
fn every_exportable_format_produces_a_file() {
    for format in [
        PixelFormat::Gray8,
        PixelFormat::Rgb24,
        PixelFormat::Bgr24,
        PixelFormat::Rgba,
        PixelFormat::Yuv420p,
        PixelFormat::Yuvj420p,
        PixelFormat::Nv12,
    ] {
        let dir = tempfile::tempdir().unwrap();
        let mut sampler = FrameSampler::jpeg(SamplerConfig::with_interval(1, dir.path())).unwrap();
        let source = TestPatternSource::new(SourceConfig {
            width: 9,
            height: 7,
            format,
            frames: 1,
            start_seq: 0,
            drop_every: 0,
        });
        for frame in source {
            sampler.process(frame.unwrap());
        }
        assert_eq!(jpegs_in(dir.path()), ["dumpframe-000000.jpg"], "{format}");
    }
}

#[test]
fn unsupported_format_is_passed_through_without_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut sampler = FrameSampler::jpeg(SamplerConfig::with_interval(1, dir.path())).unwrap();
    let len = PixelFormat::Yuv422p10le.buffer_len(4, 4).unwrap();
    let frame = Frame::new(0, 4, 4, PixelFormat::Yuv422p10le, 0, vec![0u8; len]).unwrap();

    assert_eq!(sampler.process(frame.clone()), frame);
    assert!(jpegs_in(dir.path()).is_empty());
    assert_eq!(sampler.stats().failed, 1);
}

#[test]
fn output_dir_is_created_when_missing() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("a").join("b");
    let mut sampler = FrameSampler::jpeg(SamplerConfig::with_interval(3, &nested)).unwrap();
    assert!(nested.is_dir());
    sampler.process(yuv_frame(0));
    assert_eq!(jpegs_in(&nested), ["dumpframe-000000.jpg"]);
}

#[test]
fn output_dir_over_a_file_fails_initialization() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("taken");
    std::fs::write(&file, b"x").unwrap();
    let result = FrameSampler::jpeg(SamplerConfig::with_interval(2, &file));
    assert!(matches!(result, Err(ConfigError::OutputDir { .. })));
}

#[test]
fn removed_output_dir_only_costs_exports() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("frames");
    let mut sampler = FrameSampler::jpeg(SamplerConfig::with_interval(1, &out)).unwrap();
    std::fs::remove_dir(&out).unwrap();

    let mut forwarded = Vec::new();
    for seq in 0..3 {
        sampler.filter_frame(yuv_frame(seq), &mut forwarded).unwrap();
    }
    assert_eq!(forwarded.len(), 3);
    assert_eq!(sampler.stats().failed, 3);
    assert_eq!(sampler.stats().written, 0);
}

#[test]
fn arrival_schedule_with_dropping_source() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = SamplerConfig::with_interval(2, dir.path());
    config.schedule = Schedule::Arrival;
    config.filename_prefix = "snap".into();
    let mut sampler = FrameSampler::jpeg(config).unwrap();

    let source = TestPatternSource::new(SourceConfig {
        width: 8,
        height: 8,
        format: PixelFormat::Gray8,
        frames: 6,
        start_seq: 0,
        drop_every: 2,
    });
    let mut forwarded = Vec::new();
    for frame in source {
        sampler.filter_frame(frame.unwrap(), &mut forwarded).unwrap();
    }

    // every odd seq dropped upstream: 0, 2, 4, 6, 8, 10
    let seqs: Vec<u64> = forwarded.iter().map(Frame::seq).collect();
    assert_eq!(seqs, [0, 2, 4, 6, 8, 10]);
    assert_eq!(
        jpegs_in(dir.path()),
        ["snap-000000.jpg", "snap-000002.jpg", "snap-000004.jpg"]
    );
}
