use image::{Rgba, RgbaImage};
use stego_watermark::{
    capacity_bits, compress, decode_image, embed, encode_png, extract, fit_within,
    image_from_raw, parse_data_url, resize, resize_to_match, CompressOptions, EmbedStatus,
    Error, ProcessOptions, WatermarkEngine,
};

#[allow(clippy::cast_possible_truncation)]
fn photo_like(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        Rgba([
            (x ^ y) as u8,
            (x.wrapping_mul(3) + y) as u8,
            (y.wrapping_mul(5) + 11) as u8,
            255 - (x % 7) as u8,
        ])
    })
}

#[test]
fn raw_buffer_round_trip_matches_documented_example() {
    let img = image_from_raw(10, 10, vec![0; 400]).unwrap();
    let out = embed(&img, "hi").unwrap();
    assert_eq!(out.status, EmbedStatus::Embedded { bits: 56 });
    assert_eq!(extract(&out.image).unwrap(), "hi");
}

#[test]
fn watermark_survives_png_encoding() {
    let img = photo_like(120, 80);
    let marked = embed(&img, "source=editor;id=42").unwrap();

    let png = encode_png(&marked.image).unwrap();
    let (decoded, _) = decode_image(&png).unwrap();
    assert_eq!(extract(&decoded).unwrap(), "source=editor;id=42");
}

#[test]
fn capacity_skip_leaves_image_identical() {
    let img = photo_like(3, 3);
    assert_eq!(capacity_bits(&img), 27);
    let out = embed(&img, "x").unwrap();
    assert!(!out.is_embedded());
    assert_eq!(out.image, img);
}

#[test]
fn embedding_changes_only_rgb_lsbs() {
    let img = photo_like(50, 50);
    let out = embed(&img, "a longer provenance string with some room").unwrap();
    for (before, after) in img.pixels().zip(out.image.pixels()) {
        assert_eq!(before[3], after[3]);
        for ch in 0..3 {
            assert_eq!(before[ch] & 0xFE, after[ch] & 0xFE);
        }
    }
}

#[test]
fn unmarked_image_has_no_payload() {
    let img = RgbaImage::new(64, 64);
    assert!(matches!(extract(&img), Err(Error::PayloadNotFound)));
}

#[test]
fn resampler_matches_documented_dimensions() {
    assert_eq!(fit_within(3000, 2000, 1920, 1920), (1920, 1280));
    assert_eq!(fit_within(800, 600, 1920, 1920), (800, 600));
}

#[test]
fn downscale_then_embed_round_trips() {
    let img = photo_like(400, 300);
    let small = resize(&img, 200, 200).unwrap();
    assert_eq!(small.dimensions(), (200, 150));

    let out = embed(&small, "after resize").unwrap();
    assert_eq!(extract(&out.image).unwrap(), "after resize");
}

#[test]
fn mask_is_matched_to_primary_dimensions() {
    let primary = photo_like(90, 60);
    let mask = RgbaImage::from_pixel(30, 30, Rgba([255, 255, 255, 255]));
    let matched = resize_to_match(&mask, primary.width(), primary.height()).unwrap();
    assert_eq!(matched.dimensions(), primary.dimensions());
}

#[test]
fn compress_output_decodes_back_to_fitted_image() {
    let png = encode_png(&photo_like(500, 250)).unwrap();
    let compressed = compress(&png, &CompressOptions::default()).unwrap();
    assert_eq!((compressed.width, compressed.height), (500, 250));

    let (mime, bytes) = parse_data_url(&compressed.data_url()).unwrap();
    assert_eq!(mime, "image/png");
    let (decoded, _) = decode_image(&bytes).unwrap();
    assert_eq!(decoded.dimensions(), (500, 250));
}

#[test]
fn engine_is_shareable_across_threads() {
    let engine = &WatermarkEngine::new("parallel");
    let images: Vec<RgbaImage> = (1..=4).map(|i| photo_like(10 * i, 10 * i)).collect();

    std::thread::scope(|scope| {
        let handles: Vec<_> = images
            .iter()
            .map(|img| scope.spawn(move || engine.embed(img).unwrap()))
            .collect();
        for handle in handles {
            let out = handle.join().unwrap();
            assert!(engine.verify(&out.image).unwrap());
        }
    });
}

#[test]
fn directory_processing_marks_every_image() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    for name in ["a.png", "b.png", "c.bmp"] {
        photo_like(32, 32).save(input.path().join(name)).unwrap();
    }
    std::fs::write(input.path().join("notes.txt"), "ignored").unwrap();

    let engine = WatermarkEngine::new("batch");
    let opts = ProcessOptions {
        verify: true,
        ..ProcessOptions::default()
    };
    let results = engine.process_directory(input.path(), output.path(), &opts);

    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|r| r.success && !r.skipped));
    for stem in ["a", "b", "c"] {
        let marked = output.path().join(format!("{stem}.png"));
        assert_eq!(stego_watermark::verify_file(&marked).unwrap(), "batch");
    }
}

#[test]
fn directory_processing_keeps_inputs_sharing_a_stem() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    photo_like(32, 32).save(input.path().join("a.png")).unwrap();
    photo_like(64, 16).save(input.path().join("a.bmp")).unwrap();

    let engine = WatermarkEngine::new("same stem");
    let results = engine.process_directory(input.path(), output.path(), &ProcessOptions::default());
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.success), "{results:?}");

    let mut written: Vec<String> = std::fs::read_dir(output.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    written.sort();
    assert_eq!(written, vec!["a.bmp.png", "a.png.png"]);

    let bmp_out = image::open(output.path().join("a.bmp.png")).unwrap();
    assert_eq!((bmp_out.width(), bmp_out.height()), (64, 16));
    for name in &written {
        assert_eq!(
            stego_watermark::verify_file(&output.path().join(name)).unwrap(),
            "same stem"
        );
    }
}

#[test]
fn directory_processing_copies_images_too_small_to_mark() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    photo_like(32, 32).save(input.path().join("big.png")).unwrap();
    photo_like(2, 2).save(input.path().join("tiny.png")).unwrap();

    let engine = WatermarkEngine::new("needs more than twelve bits");
    let results = engine.process_directory(input.path(), output.path(), &ProcessOptions::default());
    assert_eq!(results.len(), 2);

    let tiny = results
        .iter()
        .find(|r| r.path.ends_with("tiny.png"))
        .unwrap();
    assert!(tiny.success && tiny.skipped);

    let copied = image::open(output.path().join("tiny.png")).unwrap().to_rgba8();
    assert_eq!(copied, photo_like(2, 2));
    assert!(output.path().join("big.png").exists());
}
