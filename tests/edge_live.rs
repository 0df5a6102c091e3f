//! Edge backend against the live read-aloud service.
#![cfg(feature = "edge")]

use lesson_audio::tts::edge::EdgeClient;
use lesson_audio::{Synthesizer, VoiceSettings};

#[tokio::test]
#[ignore = "needs network access to speech.platform.bing.com; run with: cargo test --test edge_live -- --ignored"]
async fn synthesizes_mp3_clip() {
    let client = EdgeClient::builder().timeout_secs(30).build().unwrap();
    let voice = VoiceSettings::default().with_speed(0.9);

    let audio = client.synthesize("fish ball", &voice).await.unwrap();

    assert!(audio.duration_ms() > 200, "{} ms", audio.duration_ms());
    assert_eq!(audio.spec().sample_rate, 24_000);
}

#[tokio::test]
#[ignore = "needs network access to speech.platform.bing.com"]
async fn wav_output_format_decodes() {
    let client = EdgeClient::builder()
        .output_format("riff-24khz-16bit-mono-pcm")
        .build()
        .unwrap();

    let audio = client
        .synthesize("Don't worry", &VoiceSettings::default())
        .await
        .unwrap();

    assert_eq!(audio.spec().channels, 1);
    assert!(!audio.is_empty());
}
