use std::fmt::Write;

use crate::config::Config;

struct AnalysisType {
    title: &'static str,
    description: &'static str,
}

const ANALYSIS_TYPES: [AnalysisType; 6] = [
    AnalysisType {
        title: "Analisis Tren",
        description: "Identifikasi pola dan tren dalam data Anda untuk prediksi yang lebih akurat",
    },
    AnalysisType {
        title: "Analisis Distribusi",
        description: "Pahami bagaimana data Anda terdistribusi dengan visualisasi yang komprehensif",
    },
    AnalysisType {
        title: "Analisis Komparatif",
        description: "Bandingkan metrik dan KPI untuk insight yang lebih mendalam",
    },
    AnalysisType {
        title: "Analisis Prediktif",
        description: "Gunakan machine learning untuk memprediksi tren masa depan",
    },
    AnalysisType {
        title: "Analisis Segmentasi",
        description: "Kelompokkan data Anda berdasarkan karakteristik yang relevan",
    },
    AnalysisType {
        title: "Analisis Real-time",
        description: "Monitor dan analisis data secara langsung untuk keputusan cepat",
    },
];

const SCRIPT: &str = r#"
const form = document.getElementById('upload-form');
const results = document.getElementById('results');
async function pollInsights(id) {
  for (let i = 0; i < 30; i++) {
    const status = await (await fetch(`/sessions/${id}/insights`)).json();
    if (status.state === 'ready') {
      document.getElementById('insights').innerHTML =
        status.insights.map(s => `<li>${s}</li>`).join('') +
        status.actionPlan.map(s => `<li><b>${s}</b></li>`).join('');
      return;
    }
    if (status.state !== 'pending') return;
    await new Promise(r => setTimeout(r, 2000));
  }
}
form.addEventListener('submit', async (e) => {
  e.preventDefault();
  const session = await (await fetch('/sessions', { method: 'POST' })).json();
  const res = await fetch(`/sessions/${session.session_id}/upload`, { method: 'POST', body: new FormData(form) });
  const body = await res.json();
  if (!res.ok) { results.textContent = body.error; return; }
  const d = body.dashboard;
  if (!d) { results.textContent = 'File kosong'; return; }
  const base = `/sessions/${session.session_id}`;
  results.innerHTML =
    `<h2>${d.file_name}</h2><p>${d.row_count} rows analyzed</p>` +
    d.stat_cards.map(c => `<div class="card"><h4>${c.column}</h4><b>${c.average}</b><p>Range: ${c.range}</p></div>`).join('') +
    ['bar', 'line', 'pie'].filter(k => d[`${k}_chart`]).map(k => `<img src="${base}/charts/${k}">`).join('') +
    `<ul id="insights"></ul><a href="${base}/export/csv">CSV</a> <a href="${base}/export/pdf">PDF</a>`;
  pollInsights(session.session_id);
});
"#;

/// The marketing page with the upload widget.
pub fn landing_page(config: &Config) -> String {
    let mut cards = String::new();
    for analysis in &ANALYSIS_TYPES {
        let _ = write!(
            cards,
            r#"<div class="card"><h3>{}</h3><p>{}</p></div>"#,
            analysis.title, analysis.description
        );
    }

    let max_mb = config.max_file_size / (1024 * 1024);

    format!(
        r#"<!doctype html>
<html lang="id">
<head>
<meta charset="utf-8">
<title>DataVision AI</title>
<style>
body {{ font-family: Helvetica, Arial, sans-serif; margin: 0 auto; max-width: 1100px; padding: 24px; color: #1e293b; }}
.card {{ display: inline-block; vertical-align: top; width: 300px; margin: 8px; padding: 16px; border: 1px solid #cbd5e1; border-radius: 8px; }}
.upload {{ border: 2px dashed #8b5cf6; border-radius: 12px; padding: 48px; text-align: center; }}
img {{ max-width: 100%; margin: 8px 0; }}
</style>
</head>
<body>
<section>
<h1>Analisis Data dengan <span style="color:#8b5cf6">Kekuatan AI</span></h1>
<p>Upload file Excel atau CSV Anda dan dapatkan insight mendalam, visualisasi, dan rekomendasi tindakan dalam hitungan detik.</p>
</section>
<section>{cards}</section>
<section class="upload">
<h2>Upload Data Anda</h2>
<form id="upload-form">
<input type="file" name="file" accept=".xlsx,.csv" required>
<button type="submit">Pilih File</button>
</form>
<p>.xlsx &middot; .csv</p>
<p><small>Maksimal ukuran file: {max_mb}MB</small></p>
</section>
<section id="results"></section>
<footer><p>&copy; 2025 DataVision AI. Powered by Advanced AI Technology.</p></footer>
<script>{script}</script>
</body>
</html>"#,
        cards = cards,
        max_mb = max_mb,
        script = SCRIPT
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advertises_formats_and_limit() {
        let html = landing_page(&Config::default());
        assert!(html.contains(r#"accept=".xlsx,.csv""#));
        assert!(html.contains("Maksimal ukuran file: 10MB"));
        assert_eq!(html.matches(r#"<div class="card"><h3>"#).count(), 6);
    }
}
