//! A small document root on disk, plus a secret file just outside it

use docserve_cache::ByteCache;
use docserve_static::StaticFileHandler;
use rstest::fixture;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

/// Size of `assets/bundle.js`, large enough to be chunked by the content tier
pub const BIG_FILE_LEN: usize = 200 * 1024;

pub struct Site {
	_dir: TempDir,
	root: PathBuf,
}

impl Site {
	pub fn root(&self) -> &Path {
		&self.root
	}

	pub fn path(&self, relative: &str) -> PathBuf {
		self.root.join(relative)
	}

	/// Handler with roomy caches on both tiers
	pub fn handler(&self) -> StaticFileHandler {
		self.handler_with(
			Arc::new(ByteCache::new(1024 * 1024)),
			Arc::new(ByteCache::new(16 * 1024 * 1024)),
		)
	}

	pub fn handler_with(
		&self,
		tag_cache: Arc<ByteCache>,
		content_cache: Arc<ByteCache>,
	) -> StaticFileHandler {
		StaticFileHandler::new(&self.root, tag_cache, content_cache)
	}

	/// Rewrite a file and move its modification time forward by `secs`
	pub fn rewrite(&self, relative: &str, content: &str, secs: u64) {
		let path = self.path(relative);
		let before = fs::metadata(&path).unwrap().modified().unwrap();
		fs::write(&path, content).unwrap();
		set_mtime(&path, before + Duration::from_secs(secs));
	}
}

pub fn set_mtime(path: &Path, time: SystemTime) {
	File::options()
		.write(true)
		.open(path)
		.unwrap()
		.set_modified(time)
		.unwrap();
}

#[fixture]
pub fn site() -> Site {
	let dir = TempDir::new().unwrap();
	let root = dir.path().join("site");

	fs::create_dir_all(root.join("styles")).unwrap();
	fs::create_dir_all(root.join("docs")).unwrap();
	fs::create_dir_all(root.join("assets")).unwrap();

	fs::write(root.join("index.html"), "<h1>home</h1>").unwrap();
	fs::write(root.join("styles/app.css"), "body { color: red; }").unwrap();
	fs::write(root.join("docs/index.html"), "<h1>docs</h1>").unwrap();
	fs::write(root.join("assets/logo.png"), [0x89, b'P', b'N', b'G']).unwrap();
	fs::write(root.join(".env"), "SECRET=1").unwrap();
	let bundle: Vec<u8> = (0..BIG_FILE_LEN).map(|i| b'a' + (i % 26) as u8).collect();
	fs::write(root.join("assets/bundle.js"), bundle).unwrap();

	fs::write(dir.path().join("secret.txt"), "outside the root").unwrap();

	Site { _dir: dir, root }
}
