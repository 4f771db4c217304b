//! End-to-end provenance scenarios over synthetic PNG and JPEG buffers.
//!
//! The codecs never decode pixel data, so the fixtures only need to be
//! structurally valid containers; IDAT and the JPEG scan carry opaque bytes.

use sello_core::{
    classify_bytes, classify_path, mark_file, mark_image, sidecar_path_for, CoreError,
    DetectionSource, ImageFormat, MarkRequest, SidecarRecord, SignatureKind,
};
use sello_key::{KeyMaterial, PrivateKey};
use sha2::{Digest, Sha256};

fn push_png_chunk(out: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(chunk_type);
    out.extend_from_slice(data);
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(chunk_type);
    hasher.update(data);
    out.extend_from_slice(&hasher.finalize().to_be_bytes());
}

/// 10x10 RGB PNG skeleton, optionally with pre-existing tEXt entries.
fn make_png(text: &[(&str, &str)]) -> Vec<u8> {
    let mut out = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    let mut ihdr = Vec::new();
    ihdr.extend_from_slice(&10u32.to_be_bytes());
    ihdr.extend_from_slice(&10u32.to_be_bytes());
    ihdr.extend_from_slice(&[8, 2, 0, 0, 0]);
    push_png_chunk(&mut out, b"IHDR", &ihdr);
    for (keyword, value) in text {
        let mut data = keyword.as_bytes().to_vec();
        data.push(0);
        data.extend_from_slice(value.as_bytes());
        push_png_chunk(&mut out, b"tEXt", &data);
    }
    push_png_chunk(&mut out, b"IDAT", &[0xAA; 32]);
    push_png_chunk(&mut out, b"IEND", &[]);
    out
}

fn push_jpeg_segment(out: &mut Vec<u8>, marker: u8, data: &[u8]) {
    out.extend_from_slice(&[0xFF, marker]);
    out.extend_from_slice(&((data.len() + 2) as u16).to_be_bytes());
    out.extend_from_slice(data);
}

fn make_jpeg() -> Vec<u8> {
    let mut out = vec![0xFF, 0xD8];
    push_jpeg_segment(&mut out, 0xE0, b"JFIF\0\x01\x02\x00\x00\x01\x00\x01\x00\x00");
    push_jpeg_segment(&mut out, 0xDB, &[0u8; 67]);
    push_jpeg_segment(&mut out, 0xC0, &[8, 0, 10, 0, 10, 1, 1, 0x11, 0]);
    push_jpeg_segment(&mut out, 0xDA, &[1, 1, 0, 0, 0x3F, 0]);
    out.extend_from_slice(&[0x13, 0x37, 0x42, 0x42]);
    out.extend_from_slice(&[0xFF, 0xD9]);
    out
}

fn request<'a>(image: &'a [u8], prompt: &'a str, model: &'a str) -> MarkRequest<'a> {
    MarkRequest {
        image,
        prompt,
        model,
        author: "integration tests",
        key_material: None,
    }
}

#[test]
fn png_mark_then_classify_round_trip() {
    let png = make_png(&[]);
    let outcome = mark_image(&request(&png, "a cat in the fog", "model-x")).unwrap();
    assert_eq!(outcome.format, ImageFormat::Png);

    let result = classify_bytes(&outcome.image);
    assert!(result.ai_generated);
    assert_eq!(result.source, DetectionSource::EmbeddedManifest);
    assert_eq!(result.format, Some(ImageFormat::Png));
    assert_eq!(result.signature_kind, Some(SignatureKind::Simulated));

    let manifest = result.raw_manifest.unwrap();
    assert_eq!(manifest.prompt(), Some("a cat in the fog"));
    assert_eq!(manifest.model(), Some("model-x"));
}

#[test]
fn jpeg_mark_then_classify_round_trip() {
    let jpeg = make_jpeg();
    let outcome = mark_image(&request(&jpeg, "a red bicycle", "model-x")).unwrap();
    assert_eq!(outcome.format, ImageFormat::Jpeg);

    let result = classify_bytes(&outcome.image);
    assert!(result.ai_generated);
    assert_eq!(result.source, DetectionSource::EmbeddedManifest);
    assert_eq!(result.format, Some(ImageFormat::Jpeg));
    assert!(result.raw_manifest.is_some());
}

#[test]
fn content_hash_covers_pristine_bytes() {
    let png = make_png(&[]);
    let outcome = mark_image(&request(&png, "p", "m")).unwrap();
    let expected = hex::encode(Sha256::digest(&png));
    assert_eq!(outcome.manifest.content_hash(), Some(expected.as_str()));
}

#[test]
fn tampered_manifest_demotes_to_flat_tag() {
    let png = make_png(&[]);
    let outcome = mark_image(&request(&png, "a cat", "model-x")).unwrap();

    // Rewrite the embedded manifest with an altered prompt but the original
    // signature: tier 1 must reject it and tier 2 must still fire.
    let mut metadata = sello_codec::read_metadata(&outcome.image).unwrap();
    let manifest_json = metadata.get("C2PA-Manifest").unwrap().clone();
    let tampered_json = manifest_json.replace("a cat", "a dog");
    assert_ne!(manifest_json, tampered_json);
    metadata.insert("C2PA-Manifest".to_string(), tampered_json);
    let tampered = sello_codec::write_metadata(&outcome.image, &metadata).unwrap();

    let result = classify_bytes(&tampered);
    assert!(result.ai_generated);
    assert_eq!(result.source, DetectionSource::FlatTag);
    assert!(result.raw_manifest.is_none());
}

#[test]
fn unmarked_image_classifies_as_none() {
    let result = classify_bytes(&make_png(&[]));
    assert!(!result.ai_generated);
    assert_eq!(result.source, DetectionSource::None);
    assert_eq!(result.format, Some(ImageFormat::Png));
}

#[test]
fn embedded_manifest_beats_contradicting_sidecar() {
    let dir = tempfile::tempdir().unwrap();
    let image_path = dir.path().join("gato1.png");
    std::fs::write(&image_path, make_png(&[])).unwrap();

    mark_file(&image_path, None, "a cat", "model-x", "", None).unwrap();

    // Overwrite the sidecar with a record denying AI generation.
    let denial = SidecarRecord {
        ai_generated: false,
        model: String::new(),
        prompt: String::new(),
        image: "gato1.png".to_string(),
        assertions: Vec::new(),
        c2pa_manifest: None,
    };
    denial.write_for(&image_path).unwrap();

    let result = classify_path(&image_path);
    assert!(result.ai_generated);
    assert_eq!(result.source, DetectionSource::EmbeddedManifest);
}

#[test]
fn sidecar_alone_is_the_weakest_matching_tier() {
    let dir = tempfile::tempdir().unwrap();
    let image_path = dir.path().join("gato2.png");
    std::fs::write(&image_path, make_png(&[])).unwrap();

    let record = SidecarRecord {
        ai_generated: true,
        model: "model-x".to_string(),
        prompt: "a cat".to_string(),
        image: "gato2.png".to_string(),
        assertions: Vec::new(),
        c2pa_manifest: None,
    };
    record.write_for(&image_path).unwrap();

    let result = classify_path(&image_path);
    assert!(result.ai_generated);
    assert_eq!(result.source, DetectionSource::SidecarFile);
    assert_eq!(result.details.get("model").map(String::as_str), Some("model-x"));
}

#[test]
fn marking_preserves_existing_metadata() {
    let png = make_png(&[("Comment", "taken on holiday"), ("Author", "nobody")]);
    let outcome = mark_image(&request(&png, "a cat", "model-x")).unwrap();

    let metadata = sello_codec::read_metadata(&outcome.image).unwrap();
    assert_eq!(
        metadata.get("Comment").map(String::as_str),
        Some("taken on holiday")
    );
    assert_eq!(metadata.get("Author").map(String::as_str), Some("nobody"));
}

#[test]
fn marking_garbage_leaves_no_side_effects() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("not_an_image.bin");
    std::fs::write(&path, b"garbage bytes").unwrap();

    let result = mark_file(&path, None, "p", "m", "", None);
    assert!(matches!(result, Err(CoreError::UnsupportedFormat)));
    assert_eq!(std::fs::read(&path).unwrap(), b"garbage bytes");
    assert!(!sidecar_path_for(&path).exists());
}

#[test]
fn ten_by_ten_png_end_to_end() {
    let png = make_png(&[]);
    let outcome = mark_image(&request(&png, "test", "X")).unwrap();
    assert_eq!(
        outcome.manifest.signature_kind(),
        Some(SignatureKind::Simulated)
    );

    let result = classify_bytes(&outcome.image);
    assert!(result.ai_generated);
    assert_eq!(result.source, DetectionSource::EmbeddedManifest);
    assert_eq!(result.format, Some(ImageFormat::Png));
}

#[test]
fn real_key_marks_verify_end_to_end() {
    let key = PrivateKey::generate_ed25519();
    let dir = tempfile::tempdir().unwrap();
    let key_path = dir.path().join("private_key.pem");
    std::fs::write(&key_path, key.to_pkcs8_pem().unwrap()).unwrap();

    let png = make_png(&[]);
    let outcome = mark_image(&MarkRequest {
        image: &png,
        prompt: "a cat",
        model: "model-x",
        author: "tester",
        key_material: Some(KeyMaterial::new(Some(key_path), None)),
    })
    .unwrap();
    assert!(outcome.downgrade.is_none());

    let result = classify_bytes(&outcome.image);
    assert_eq!(result.source, DetectionSource::EmbeddedManifest);
    assert_eq!(result.signature_kind, Some(SignatureKind::Real));
}

#[test]
fn mark_file_writes_image_and_sidecar() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.jpg");
    std::fs::write(&input, make_jpeg()).unwrap();
    let output = dir.path().join("marked.jpg");

    let (outcome, sidecar_path) =
        mark_file(&input, Some(&output), "a cat", "model-x", "", None).unwrap();
    assert_eq!(outcome.format, ImageFormat::Jpeg);
    assert_eq!(sidecar_path, dir.path().join("marked_manifest.json"));

    // Input untouched, output marked.
    assert_eq!(std::fs::read(&input).unwrap(), make_jpeg());
    let result = classify_path(&output);
    assert_eq!(result.source, DetectionSource::EmbeddedManifest);

    let sidecar = SidecarRecord::read_for(&output).unwrap().unwrap();
    assert!(sidecar.ai_generated);
    assert!(sidecar.c2pa_manifest.is_some());
}
