//! The outbound `PidOptions` XML encoder.

use primitives_pid::{CaptureOptions, Modality};

/// Build the `PidOptions` document configuring one capture session.
///
/// The schema is fixed by the UIDAI RD service spec: exactly one of the
/// `fCount`/`iCount`/`pCount` attributes is non-zero, selected by the
/// requested modality, and the `wadh` attribute is omitted entirely when the
/// token is empty: some vendors reject an empty `wadh=""`.
///
/// Pure function of the options; the output is dispatched and discarded.
pub fn build_pid_options(options: &CaptureOptions) -> String {
    // Fingerprint sessions may request up to two fingers; iris and face
    // sessions are capped at one capture by the schema.
    let (f_count, i_count, p_count) = match options.modality {
        Modality::Finger => (options.clamped_count(), 0, 0),
        Modality::Iris => (0, 1, 0),
        Modality::Face => (0, 0, 1),
    };

    let wadh_attr = if options.wadh.is_empty() {
        String::new()
    } else {
        format!(" wadh=\"{}\"", options.wadh)
    };

    format!(
        "<PidOptions ver=\"1.0\">\n  \
         <Opts fCount=\"{f_count}\" fType=\"0\" iCount=\"{i_count}\" iType=\"0\" \
         pCount=\"{p_count}\" pType=\"0\" format=\"0\" pidVer=\"2.0\" \
         timeout=\"{timeout}\" env=\"P\"{wadh_attr} />\n\
         </PidOptions>",
        timeout = options.timeout_millis(),
    )
}
