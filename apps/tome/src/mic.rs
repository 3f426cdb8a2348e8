use std::{future::Future, path::Path};

use color_eyre::eyre;
use cpal::{
	InputCallbackInfo, SampleFormat, StreamConfig, StreamError,
	traits::{DeviceTrait, HostTrait, StreamTrait},
};
use hound::{WavSpec, WavWriter};
use tempfile::NamedTempFile;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Mono 16-bit samples captured from the input device.
pub struct Recording {
	pub samples: Vec<i16>,
	pub sample_rate: u32,
}

/// Records the default input device between two presses of Enter and returns the audio as a
/// temporary WAV file. The file is removed when the handle is dropped.
pub async fn record_wav() -> color_eyre::Result<NamedTempFile> {
	println!("Press Enter to start recording...");
	wait_for_enter().await?;

	let recording = capture(async {
		println!("Recording... Press Enter to stop.");

		if let Err(err) = wait_for_enter().await {
			tracing::warn!(error = %err, "Failed to read stdin. Stopping the recording.");
		}
	})
	.await?;

	if recording.samples.is_empty() {
		return Err(eyre::eyre!("No audio was recorded."));
	}

	let file = tempfile::Builder::new().prefix("tome-mic-").suffix(".wav").tempfile()?;

	write_wav(file.path(), &recording)?;

	tracing::info!(
		samples = recording.samples.len(),
		sample_rate = recording.sample_rate,
		"Recording saved."
	);

	Ok(file)
}

/// Captures the default input device until `stop` completes.
async fn capture(stop: impl Future<Output = ()>) -> color_eyre::Result<Recording> {
	let device = cpal::default_host()
		.default_input_device()
		.ok_or_else(|| eyre::eyre!("No microphone is available."))?;
	let supported = device.default_input_config()?;
	let sample_format = supported.sample_format();
	let config: StreamConfig = supported.into();
	let channels = usize::from(config.channels.max(1));
	let (tx, rx) = mpsc::unbounded_channel();
	let on_error = |err: StreamError| tracing::error!(error = %err, "Microphone stream failed.");
	let stream = match sample_format {
		SampleFormat::I16 => device.build_input_stream(
			&config,
			move |data: &[i16], _: &InputCallbackInfo| {
				send_first_channel(&tx, data, channels, |sample| sample)
			},
			on_error,
			None,
		)?,
		SampleFormat::F32 => device.build_input_stream(
			&config,
			move |data: &[f32], _: &InputCallbackInfo| {
				send_first_channel(&tx, data, channels, f32_to_i16)
			},
			on_error,
			None,
		)?,
		other => return Err(eyre::eyre!("Unsupported microphone sample format {other:?}.")),
	};

	stream.play()?;

	let samples = collect_until(rx, stop).await;

	drop(stream);

	Ok(Recording { samples, sample_rate: config.sample_rate.0 })
}

/// Keeps the first channel of each interleaved frame and hands it to the collector.
fn send_first_channel<T: Copy>(
	tx: &UnboundedSender<Vec<i16>>,
	data: &[T],
	channels: usize,
	convert: impl Fn(T) -> i16,
) {
	let chunk = data.chunks(channels).map(|frame| convert(frame[0])).collect();

	// The receiver is gone once the recording stopped.
	let _ = tx.send(chunk);
}

fn f32_to_i16(sample: f32) -> i16 {
	(sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16
}

/// Appends every chunk received before `stop` completes, then drains chunks already queued.
pub async fn collect_until(
	mut chunks: UnboundedReceiver<Vec<i16>>,
	stop: impl Future<Output = ()>,
) -> Vec<i16> {
	tokio::pin!(stop);

	let mut samples = Vec::new();

	loop {
		tokio::select! {
			biased;
			_ = &mut stop => break,
			chunk = chunks.recv() => match chunk {
				Some(chunk) => samples.extend(chunk),
				None => break,
			},
		}
	}

	chunks.close();

	while let Ok(chunk) = chunks.try_recv() {
		samples.extend(chunk);
	}

	samples
}

pub fn write_wav(path: &Path, recording: &Recording) -> color_eyre::Result<()> {
	let spec = WavSpec {
		channels: 1,
		sample_rate: recording.sample_rate,
		bits_per_sample: 16,
		sample_format: hound::SampleFormat::Int,
	};
	let mut writer = WavWriter::create(path, spec)?;

	for sample in &recording.samples {
		writer.write_sample(*sample)?;
	}

	writer.finalize()?;

	Ok(())
}

async fn wait_for_enter() -> color_eyre::Result<()> {
	tokio::task::spawn_blocking(|| {
		let mut line = String::new();

		std::io::stdin().read_line(&mut line).map(|_| ())
	})
	.await??;

	Ok(())
}
