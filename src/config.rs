//! Loading agent configuration (prompt templates + toast lifetime) from TOML.
//!
//! See `AgentConfig` and `Prompts` for expected schema. Every prompt uses
//! `{key}` placeholders; the keys available to each template are listed on
//! the field.

use std::path::PathBuf;

use serde::Deserialize;
use tracing::{error, info};

pub const DEFAULT_TOAST_TTL_MS: u64 = 3000;

#[derive(Clone, Debug, Deserialize)]
pub struct AgentConfig {
  #[serde(default)]
  pub prompts: Prompts,
  #[serde(default = "default_toast_ttl_ms")]
  pub toast_ttl_ms: u64,
}

impl Default for AgentConfig {
  fn default() -> Self {
    Self { prompts: Prompts::default(), toast_ttl_ms: DEFAULT_TOAST_TTL_MS }
  }
}

fn default_toast_ttl_ms() -> u64 { DEFAULT_TOAST_TTL_MS }

/// Prompts used by the content service. Defaults target the Indonesian
/// Kurikulum Merdeka; override them in TOML to tune tone/structure.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  /// {level} {grade} {phase} {subject} {topic}
  pub outline_template: String,
  /// {doc_name} {level} {grade} {phase} {subject} {topic}
  pub document_template: String,
  /// {total} {level} {grade} {phase} {subject} {topic}
  /// {mc_regular} {mc_advanced} {essay_regular} {essay_advanced}
  pub question_batch_template: String,
  /// {doc_name} {level} {grade} {phase} {subject} {topic}
  pub admin_template: String,
  /// {questions} {level} {grade} {phase} {subject} {topic}
  pub exam_package_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      outline_template: r#"Tuliskan seluruh **Capaian Pembelajaran (CP) Kurikulum Merdeka** secara lengkap pada jenjang/sekolah {level}
untuk kelas {grade} (fase {phase}), mata pelajaran {subject}.
Sertakan catatan keterkaitan CP dengan materi yang sedang diajarkan: "{topic}".

Struktur output harus berbentuk **markdown dengan heading per sub-bab (kelas, elemen, atau capaian kompetensi)**.
Jabarkan CP secara detil dan terstruktur, mulai dari rasional mapel, tujuan, elemen, hingga indikator/uraian capaian di setiap kelas serta fase yang berlaku. Tampilkan jika tersedia:
- Rasional atau pengantar mapel/fase
- Daftar elemen kompetensi (misal: literasi, numerasi, adab, pemrograman, dsb)
- Deskripsi CP per elemen dan tahun/kelas
- Indikator kemampuan minimum sesuai dokumen resmi Kurikulum Merdeka

Gunakan format seperti di bawah ini:

# Capaian Pembelajaran (CP) Kurikulum Merdeka
## {level} - {subject} - Kelas {grade} (Fase {phase})

### Rasional Mata Pelajaran
[Uraian ringkas rasional pentingnya mempelajari mapel ini di fase & jenjang tersebut.]

### Tujuan Umum
- [Tujuan umum capaian pembelajaran pada kelas/fase/mapel ini]

### Elemen/Komponen Dasar
- [Daftar elemen/kompetensi inti]

### Capaian Pembelajaran Per Elemen Per Kelas
#### Elemen: [nama elemen]
- Kelas {grade}/Fase {phase}:
    - [Deskripsi/jabaran CP detil per fase/kelas]

Tampilkan dalam **format markdown yang rapi dan berskala jenjang**.
Selalu adaptasi istilah dan kompetensi sesuai dokumen resmi Kemendikbud/Kemenag."#.into(),

      document_template: r#"Bertindaklah sebagai ahli kurikulum profesional untuk Kurikulum Merdeka di Indonesia.
Buatkan dokumen lengkap "{doc_name}" untuk:
- Jenjang: {level}
- Kelas: {grade} (Fase {phase})
- Mata Pelajaran: {subject}
- Materi Pokok: {topic}

Instruksi Penting:
1. **Output HARUS dalam format HTML murni** (gunakan tag <h1>, <h2>, <p>, <ul>, <li>, <strong>, <table>, <tr>, <td>, dll).
2. **JANGAN** gunakan Markdown (seperti ** atau ##).
3. **JANGAN** sertakan block code ```html. Langsung output raw HTML.
4. Gunakan CSS inline sederhana jika perlu untuk tabel (misal: border="1" style="border-collapse: collapse; width: 100%;").
5. Mengikuti format resmi Kurikulum Merdeka terbaru (termasuk Profil Pelajar Pancasila).
6. Bahasa Indonesia formal dan pedagogis.
7. Lengkap dengan detail (Capaian Pembelajaran Fase {phase}, Tujuan Pembelajaran, Langkah Kegiatan, Asesmen)."#.into(),

      question_batch_template: r#"Buatkan paket soal latihan ({total} butir) untuk siswa:
- Jenjang: {level}
- Kelas: {grade} (Fase {phase})
- Mapel: {subject}
- Materi: {topic}

Komposisi Soal:
1. Pilihan Ganda (Reguler): {mc_regular} soal. (Pemahaman konsep dasar).
2. Pilihan Ganda TKA (Tes Kemampuan Akademik): {mc_advanced} soal. (HOTS, Analisis, Studi Kasus, Penalaran Mendalam).
3. Uraian/Essay (Reguler): {essay_regular} soal.
4. Uraian/Essay TKA (Tes Kemampuan Akademik): {essay_advanced} soal. (HOTS, Problem Solving).

Output HARUS berupa Array JSON valid dengan skema berikut:
[
  {
    "type": "string (Pilihan Ganda | Essay)",
    "category": "string (Reguler | TKA)",
    "difficulty": "string (Mudah | Sedang | Sulit)",
    "question": "string (Teks pertanyaan)",
    "options": ["string (Opsi A)", "string (Opsi B)", "string (Opsi C)", "string (Opsi D)"] (Wajib ada isi jika Pilihan Ganda, Array kosong [] jika Essay),
    "correctAnswer": number (index 0-3 untuk jawaban benar jika PG, null jika Essay),
    "answer": "string (Kunci jawaban lengkap / Pembahasan)"
  }
]

Pastikan soal TKA benar-benar menguji kemampuan berpikir tingkat tinggi (HOTS) sesuai Fase {phase}."#.into(),

      admin_template: r#"Buatkan dokumen administrasi guru "{doc_name}" yang realistis dan siap pakai.
Konteks:
- Guru Mapel: {subject}
- Kelas: {grade} ({level} - Fase {phase})
- Materi Saat Ini: {topic}
- Waktu: Semester berjalan

Instruksi:
1. **Output HARUS dalam format HTML murni** (gunakan <table>, <tr>, <td>, <th>, <h3>, <p>, dll).
2. **Gunakan Tabel HTML** dengan border="1" untuk data seperti Absensi, Nilai, atau Jadwal agar rapi di Microsoft Word.
3. Buat data dummy yang terlihat nyata.
4. Berikan saran tindak lanjut atau catatan guru.
5. **JANGAN** gunakan Markdown.
6. **JANGAN** sertakan block code ```html."#.into(),

      exam_package_template: r#"Bertindaklah sebagai pembuat soal profesional.
Konteks: {level} - {subject} - Kelas {grade} (Fase {phase}), materi "{topic}".
Saya memiliki daftar pertanyaan berikut:
{questions}

Buatkan dokumen "Paket Evaluasi Lengkap" dalam format HTML murni yang rapi untuk di-export ke Word.
Dokumen harus mencakup bagian-bagian berikut secara berurutan (gunakan page break antar bagian jika memungkinkan):

1. **RINGKASAN MATERI**: Buatkan ringkasan singkat padat tentang materi "{topic}" ({subject} Kelas {grade}) sebagai bahan belajar siswa sebelum ujian.

2. **KISI-KISI SOAL**: Tabel berisi No, Kompetensi Dasar (karang yang relevan dengan Kurikulum Merdeka), Materi, Indikator Soal, Kategori (Reguler/TKA), Bentuk Soal, dan No Soal.

3. **NASKAH SOAL**: Tampilkan soal-soal di atas dalam format siap cetak untuk siswa. (Jangan sertakan kunci jawaban di bagian ini). Berikan header kop sekolah dummy. Pisahkan bagian Pilihan Ganda dan Uraian.

4. **KUNCI JAWABAN & PEMBAHASAN**: Daftar kunci jawaban lengkap dengan pembahasan detail untuk setiap nomor.

5. **ANALISIS SOAL KUALITATIF**: Tabel analisis butir soal (Materi, Konstruksi, Bahasa) yang menyatakan soal layak digunakan.

6. **RUBRIK PENILAIAN**: Pedoman penskoran (skor benar/salah untuk PG, rubrik penilaian untuk Essay).

**Instruksi Teknis:**
- Output HANYA HTML raw. Tanpa markdown ```.
- Gunakan <style> untuk mengatur font Times New Roman, border tabel (collapse), dan page-break.
- Gunakan tabel HTML dengan border="1" agar terlihat jelas di Word.
- Pastikan konten relevan dengan materi "{topic}"."#.into(),
    }
  }
}

/// Attempt to load `AgentConfig` from AGENT_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_agent_config_from_env() -> Option<AgentConfig> {
  let path = std::env::var("AGENT_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<AgentConfig>(&s) {
      Ok(cfg) => {
        info!(target: "kurikulum_backend", %path, "Loaded agent config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "kurikulum_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "kurikulum_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

/// Directory holding the persisted slots. STORAGE_DIR, default ./data.
pub fn storage_dir_from_env() -> PathBuf {
  std::env::var("STORAGE_DIR")
    .map(PathBuf::from)
    .unwrap_or_else(|_| PathBuf::from("./data"))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn partial_toml_keeps_other_defaults() {
    let cfg: AgentConfig = toml::from_str(
      r#"
      toast_ttl_ms = 5000
      [prompts]
      outline_template = "CP {subject}"
      "#,
    )
    .unwrap();
    assert_eq!(cfg.toast_ttl_ms, 5000);
    assert_eq!(cfg.prompts.outline_template, "CP {subject}");
    assert_eq!(cfg.prompts.document_template, Prompts::default().document_template);
  }

  #[test]
  fn empty_toml_is_all_defaults() {
    let cfg: AgentConfig = toml::from_str("").unwrap();
    assert_eq!(cfg.toast_ttl_ms, DEFAULT_TOAST_TTL_MS);
  }

  #[test]
  fn default_templates_carry_their_placeholders() {
    let p = Prompts::default();
    let templates = [
      ("outline", &p.outline_template),
      ("document", &p.document_template),
      ("question_batch", &p.question_batch_template),
      ("admin", &p.admin_template),
      ("exam_package", &p.exam_package_template),
    ];
    for (name, tpl) in templates {
      for key in ["{level}", "{grade}", "{phase}", "{subject}", "{topic}"] {
        assert!(tpl.contains(key), "{name} template is missing {key}");
      }
    }
    for key in ["{mc_regular}", "{mc_advanced}", "{essay_regular}", "{essay_advanced}"] {
      assert!(p.question_batch_template.contains(key), "missing {key}");
    }
    assert!(p.document_template.contains("{doc_name}"));
    assert!(p.exam_package_template.contains("{questions}"));
  }
}
