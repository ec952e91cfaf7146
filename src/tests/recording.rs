use crate::audio::capture::CaptureConstraints;
use crate::audio::pipeline::{self, ConversionStatus, FinishedRecording};
use crate::audio::recorder::{Recorder, Toggle};
use crate::session::{Selection, Session, SessionState};
use crate::tests::support::{ScriptedSource, sine};
use crate::types::asset::{AudioAsset, RECORDING_FILE_NAME, WAV_MIME};
use std::io::Cursor;

fn chunked(samples: Vec<f32>, size: usize) -> Vec<Vec<f32>> {
    samples.chunks(size).map(<[f32]>::to_vec).collect()
}

fn record_once(recorder: &mut Recorder<ScriptedSource>) -> FinishedRecording {
    assert!(matches!(recorder.toggle().unwrap(), Toggle::Started(_)));
    match recorder.toggle().unwrap() {
        Toggle::Stopped(finished) => finished,
        other => panic!("expected stop, got {other:?}"),
    }
}

#[test]
fn quiet_three_second_recording_is_boosted_and_encoded() {
    let samples = sine(44_100, 3.0, 220.0, 0.05);
    assert_eq!(samples.len(), 132_300);
    let source = ScriptedSource::mono(44_100, chunked(samples, 1_024));
    let mut recorder = Recorder::new(source, CaptureConstraints::default());

    let finished = record_once(&mut recorder);
    assert_eq!(finished.status, ConversionStatus::Converted);
    assert_eq!(finished.asset.mime_type, WAV_MIME);
    assert_eq!(finished.asset.len(), 44 + 264_600);
    assert_eq!(
        u32::from_le_bytes(finished.asset.bytes[40..44].try_into().unwrap()),
        264_600
    );

    let mut reader = hound::WavReader::new(Cursor::new(finished.asset.bytes.clone())).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.channels, 1);
    assert_eq!(spec.sample_rate, 44_100);
    assert_eq!(spec.bits_per_sample, 16);
    assert_eq!(spec.sample_format, hound::SampleFormat::Int);

    let decoded: Vec<i16> = reader.samples::<i16>().map(Result::unwrap).collect();
    assert_eq!(decoded.len(), 132_300);
    let peak = decoded.iter().map(|s| i32::from(*s).abs()).max().unwrap();
    // 0.7 of full scale: 22936 on the positive side, 22937 on the negative
    assert!((22_930..=22_938).contains(&peak), "peak was {peak}");
    assert_eq!(recorder.source().releases(), 1);
}

#[test]
fn loud_stereo_recording_keeps_its_levels() {
    let frame = [0.5_f32, -0.25];
    let samples: Vec<f32> = frame.iter().copied().cycle().take(2 * 4_410).collect();
    let source = ScriptedSource::new(44_100, 2, chunked(samples, 882));
    let mut recorder = Recorder::new(source, CaptureConstraints::default());

    let finished = record_once(&mut recorder);
    assert_eq!(finished.status, ConversionStatus::Converted);

    let mut reader = hound::WavReader::new(Cursor::new(finished.asset.bytes)).unwrap();
    assert_eq!(reader.spec().channels, 2);
    let decoded: Vec<i16> = reader.samples::<i16>().map(Result::unwrap).collect();
    assert_eq!(decoded.len(), 2 * 4_410);
    assert_eq!(&decoded[..4], &[16_383, -8_192, 16_383, -8_192]);
}

#[test]
fn undecodable_recording_is_uploaded_unchanged() {
    let raw = AudioAsset::new(b"OggS\0not really a stream".to_vec(), "audio/ogg;codecs=opus");
    let finished = pipeline::finish_recording(raw.clone());
    assert_eq!(finished.status, ConversionStatus::NeedsConversion);
    assert_eq!(finished.asset, raw);

    let selection = Selection::Recording(finished);
    assert_eq!(selection.file_name(), RECORDING_FILE_NAME);
    assert_eq!(selection.asset().bytes, raw.bytes);
    assert_eq!(
        selection.status_line(),
        "Recording ready (may need conversion)"
    );
}

#[test]
fn session_cycles_between_recording_and_file() {
    let mut session = Session::new();
    let mut recorder = Recorder::new(
        ScriptedSource::mono(44_100, chunked(sine(44_100, 0.5, 440.0, 0.3), 512)),
        CaptureConstraints::default(),
    );

    session.toggle_recording(&mut recorder).unwrap();
    assert_eq!(session.state(), SessionState::Recording);
    assert!(session.upload_target().is_none());
    session.toggle_recording(&mut recorder).unwrap();
    assert_eq!(session.state(), SessionState::Ready);

    session
        .select_file(AudioAsset::new(vec![0; 32], "audio/flac"), "voice.flac")
        .unwrap();
    assert_eq!(session.upload_target().unwrap().1, "voice.flac");

    session.toggle_recording(&mut recorder).unwrap();
    assert!(session.selection().is_none());
    session.toggle_recording(&mut recorder).unwrap();
    assert_eq!(session.upload_target().unwrap().1, RECORDING_FILE_NAME);
    assert_eq!(recorder.source().releases(), 2);
}

#[test]
fn source_mime_tags_the_raw_recording() {
    let source =
        ScriptedSource::mono(44_100, vec![vec![0.2; 256]]).with_mime("audio/wav;codecs=float");
    let mut recorder = Recorder::new(source, CaptureConstraints::default());
    assert!(matches!(recorder.toggle().unwrap(), Toggle::Started(_)));
    let raw = recorder.stop_raw().unwrap();
    assert_eq!(raw.mime_type, "audio/wav;codecs=float");
    assert_eq!(&raw.bytes[..4], b"RIFF");
}
