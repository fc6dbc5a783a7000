use std::collections::BTreeSet;
use std::path::PathBuf;

#[derive(Debug, Default, PartialEq)]
pub struct Args {
    /// Gallery document to show and write edits back to.
    pub gallery: Option<PathBuf>,
    pub config: Option<PathBuf>,
    /// Directory relative image URLs are resolved against.
    pub images: Option<PathBuf>,
    pub edit: bool,
}

impl Args {
    // parse arguments, return set of unrecognized args
    pub fn parse(args: &[String]) -> (Self, BTreeSet<String>) {
        let mut unrecognized_args = BTreeSet::new();
        let mut res = Args::default();

        let mut i = 0;
        let len = args.len();
        while i < len {
            let arg = &args[i];

            if arg == "--edit" {
                res.edit = true;
            } else if arg == "--gallery" || arg == "--config" || arg == "--images" {
                i += 1;
                let Some(value) = args.get(i) else {
                    log::error!("{} argument missing?", arg);
                    continue;
                };
                let path = Some(PathBuf::from(value));
                match arg.as_str() {
                    "--gallery" => res.gallery = path,
                    "--config" => res.config = path,
                    _ => res.images = path,
                }
            } else {
                unrecognized_args.insert(arg.clone());
            }

            i += 1;
        }

        (res, unrecognized_args)
    }

    /// Where images live: `--images`, else next to the gallery document.
    pub fn image_dir(&self) -> PathBuf {
        if let Some(images) = &self.images {
            return images.clone();
        }
        self.gallery
            .as_ref()
            .and_then(|gallery| gallery.parent())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}
