//! Rendering of API objects.

use std::io::{self, ErrorKind, Write};

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Serialize;

/// Serialization format for objects written to stdout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
	#[default]
	Yaml,
	Json,
}

/// Write a single object in the requested format.
pub fn write_object<T: Serialize, W: Write>(
	mut writer: W,
	format: OutputFormat,
	object: &T,
) -> Result<()> {
	match format {
		OutputFormat::Yaml => {
			let yaml = serde_yaml::to_string(object).context("serializing to YAML")?;
			writer.write_all(yaml.as_bytes())?;
		}
		OutputFormat::Json => {
			serde_json::to_writer_pretty(&mut writer, object).context("serializing to JSON")?;
			writeln!(writer)?;
		}
	}
	writer.flush()?;
	Ok(())
}

/// A writer wrapper that silently handles broken pipe errors.
///
/// When the underlying writer returns a broken pipe error (EPIPE), this wrapper
/// converts it to a successful write, so `cactl namespaces | head -1` exits cleanly.
pub struct BrokenPipeGuard<W> {
	inner: W,
}

impl<W> BrokenPipeGuard<W> {
	pub fn new(inner: W) -> Self {
		Self { inner }
	}
}

impl<W: Write> Write for BrokenPipeGuard<W> {
	fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
		match self.inner.write(buf) {
			Err(e) if e.kind() == ErrorKind::BrokenPipe => Ok(buf.len()),
			other => other,
		}
	}

	fn flush(&mut self) -> io::Result<()> {
		match self.inner.flush() {
			Err(e) if e.kind() == ErrorKind::BrokenPipe => Ok(()),
			other => other,
		}
	}
}

#[cfg(test)]
mod tests {
	use assert_matches::assert_matches;
	use indoc::indoc;
	use serde_json::json;

	use super::*;

	struct BrokenPipeWriter;

	impl Write for BrokenPipeWriter {
		fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
			Err(io::Error::new(ErrorKind::BrokenPipe, "broken pipe"))
		}

		fn flush(&mut self) -> io::Result<()> {
			Err(io::Error::new(ErrorKind::BrokenPipe, "broken pipe"))
		}
	}

	#[test]
	fn test_yaml() {
		let mut out = Vec::new();
		write_object(&mut out, OutputFormat::Yaml, &json!({"kind": "Secret", "type": "Opaque"}))
			.unwrap();
		assert_eq!(
			String::from_utf8(out).unwrap(),
			indoc! {"
				kind: Secret
				type: Opaque
			"}
		);
	}

	#[test]
	fn test_json() {
		let mut out = Vec::new();
		write_object(&mut out, OutputFormat::Json, &json!({"kind": "Secret"})).unwrap();
		assert_eq!(String::from_utf8(out).unwrap(), "{\n  \"kind\": \"Secret\"\n}\n");
	}

	#[test]
	fn test_broken_pipe_is_ignored() {
		let writer = BrokenPipeGuard::new(BrokenPipeWriter);
		let result = write_object(writer, OutputFormat::Json, &json!({"kind": "Secret"}));
		assert_matches!(result, Ok(()));
	}
}
