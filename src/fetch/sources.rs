use url::Url;

/// Host the sharing service lives on; the URL rewrites below only apply to it.
const BOX_HOST: &str = "app.box.com";

/// Ordered list of download candidates for one configured shared link.
/// Highest priority first; the fetcher tries them strictly in order.
pub fn candidate_urls(shared_url: &str, direct_file_url: Option<&str>) -> Vec<String> {
    let mut out = Vec::with_capacity(3);
    if let Some(direct) = direct_file_url {
        out.push(direct.to_string());
    }
    out.push(to_download_url(shared_url));
    if let Some(static_zip) = to_static_zip_url(shared_url) {
        out.push(static_zip);
    }
    out
}

/// Force `download=1` onto a shared link so the service hands back the file
/// instead of its viewer page. Unparseable input is returned unchanged.
pub fn to_download_url(shared_url: &str) -> String {
    match Url::parse(shared_url) {
        Ok(mut url) => {
            let kept: Vec<(String, String)> = url
                .query_pairs()
                .filter(|(k, _)| k != "download")
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect();
            url.query_pairs_mut()
                .clear()
                .extend_pairs(kept)
                .append_pair("download", "1");
            url.to_string()
        }
        Err(_) => shared_url.to_string(),
    }
}

/// Rewrite `https://app.box.com/s/<id>` to the static archive form
/// `https://app.box.com/shared/static/<id>.zip`. Returns `None` unless the
/// host and path match that exact shape.
pub fn to_static_zip_url(shared_url: &str) -> Option<String> {
    let url = Url::parse(shared_url).ok()?;
    if url.host_str() != Some(BOX_HOST) {
        return None;
    }
    let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();
    let s_pos = segments.iter().position(|&s| s == "s")?;
    let id = segments.get(s_pos + 1)?;
    Some(format!("https://{}/shared/static/{}.zip", BOX_HOST, id))
}
