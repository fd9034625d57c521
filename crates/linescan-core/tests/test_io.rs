use linescan_core::error::LinescanError;
use linescan_core::frame::{subtract_black_level, uniform_dim, Frame};
use linescan_core::io::{load_image, read_stack, save_image, save_png_preview, write_stack};
use ndarray::Array2;

fn ramp(h: usize, w: usize, scale: f32) -> Frame {
    Frame::new(
        Array2::from_shape_fn((h, w), |(r, c)| (r * w + c) as f32 * scale),
        32,
    )
}

#[test]
fn test_write_read_stack_keeps_pages() {
    let frames: Vec<Frame> = (0..3).map(|i| ramp(5, 7, i as f32 + 0.5)).collect();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stack.tiff");
    write_stack(&path, &frames).unwrap();

    let loaded = read_stack(&path).unwrap();
    assert_eq!(loaded.len(), 3);
    for (i, (a, b)) in frames.iter().zip(&loaded).enumerate() {
        assert_eq!(b.width(), 7);
        assert_eq!(b.height(), 5);
        assert_eq!(b.metadata.frame_index, i);
        assert_eq!(a.data, b.data);
    }
}

#[test]
fn test_save_image_single_page_tiff() {
    let frame = ramp(4, 4, 0.25);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("single.tif");
    save_image(&frame, &path).unwrap();

    let loaded = read_stack(&path).unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].data, frame.data);
}

#[test]
fn test_write_empty_stack() {
    let dir = tempfile::tempdir().unwrap();
    let err = write_stack(&dir.path().join("empty.tiff"), &[]).unwrap_err();
    assert!(matches!(err, LinescanError::EmptySequence));
}

#[test]
fn test_png_preview_roundtrip_scale() {
    let mut data = Array2::<f32>::zeros((8, 8));
    data[[0, 0]] = 1000.0;
    data[[4, 4]] = 500.0;
    let frame = Frame::new(data, 16);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("preview.png");
    save_png_preview(&frame, &path).unwrap();

    let loaded = load_image(&path).unwrap();
    assert_eq!(loaded.original_bit_depth, 8);
    assert_eq!(loaded.data[[0, 0]], 255.0);
    assert_eq!(loaded.data[[4, 4]], 127.0);
    assert_eq!(loaded.data[[7, 7]], 0.0);
}

#[test]
fn test_read_stack_of_png_is_single_frame() {
    let frame = ramp(6, 6, 1.0);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("frame.png");
    save_image(&frame, &path).unwrap();

    let stack = read_stack(&path).unwrap();
    assert_eq!(stack.len(), 1);
    assert_eq!(stack[0].dim(), (6, 6));
}

#[test]
fn test_read_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = read_stack(&dir.path().join("missing.tiff"));
    assert!(matches!(result, Err(LinescanError::Io(_))));
}

// ---------------------------------------------------------------------------
// Frame helpers
// ---------------------------------------------------------------------------

#[test]
fn test_uniform_dim() {
    let frames = vec![ramp(3, 4, 1.0), ramp(3, 4, 2.0)];
    assert_eq!(uniform_dim(&frames).unwrap(), (3, 4));

    let mixed = vec![ramp(3, 4, 1.0), ramp(4, 3, 1.0)];
    assert!(matches!(
        uniform_dim(&mixed),
        Err(LinescanError::DimensionMismatch {
            expected_width: 4,
            expected_height: 3,
            width: 3,
            height: 4
        })
    ));
    assert!(matches!(uniform_dim(&[]), Err(LinescanError::EmptySequence)));
}

#[test]
fn test_subtract_black_level() {
    let mut frames = vec![Frame::new(Array2::from_elem((2, 2), 110.0), 16)];
    subtract_black_level(&mut frames, 100.0);
    assert!(frames[0].data.iter().all(|&v| v == 10.0));
}
