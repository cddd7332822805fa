//! Static reference tables: levels, grades, subjects, example topics and the
//! document / administrative document catalogs.

use serde::Serialize;

use crate::domain::IconRef;

#[derive(Clone, Copy, Debug, Serialize)]
pub struct EducationLevel {
  pub id: &'static str,
  pub label: &'static str,
}

#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentType {
  pub id: &'static str,
  pub name: &'static str,
  pub icon: IconRef,
  pub color: &'static str,
}

#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminType {
  pub id: &'static str,
  pub name: &'static str,
  pub icon: IconRef,
  pub color: &'static str,
  pub description: &'static str,
}

pub const LEVELS: &[EducationLevel] = &[
  EducationLevel { id: "early-childhood", label: "TK/PAUD" },
  EducationLevel { id: "primary", label: "SD/MI" },
  EducationLevel { id: "lower-secondary", label: "SMP/MTs" },
  EducationLevel { id: "upper-secondary", label: "SMA/MA" },
  EducationLevel { id: "vocational", label: "SMK" },
];

pub const DOCUMENT_TYPES: &[DocumentType] = &[
  DocumentType { id: "modul", name: "Modul Ajar", icon: IconRef::BookOpen, color: "#6366F1" },
  DocumentType { id: "kktp", name: "KKTP", icon: IconRef::Star, color: "#F59E0B" },
  DocumentType { id: "atp", name: "ATP", icon: IconRef::Zap, color: "#10B981" },
  DocumentType { id: "prota", name: "Program Tahunan", icon: IconRef::FileText, color: "#8B5CF6" },
  DocumentType { id: "promes", name: "Program Semester", icon: IconRef::FileText, color: "#EC4899" },
];

pub const ADMIN_TYPES: &[AdminType] = &[
  AdminType { id: "jadwal", name: "Jadwal Mengajar", icon: IconRef::Calendar, color: "#3B82F6", description: "Jadwal mengajar per semester" },
  AdminType { id: "absensi", name: "Daftar Hadir", icon: IconRef::Users, color: "#10B981", description: "Rekapitulasi kehadiran siswa" },
  AdminType { id: "nilai", name: "Daftar Nilai", icon: IconRef::Star, color: "#F59E0B", description: "Leger nilai siswa" },
  AdminType { id: "jurnal", name: "Jurnal Mengajar", icon: IconRef::Book, color: "#8B5CF6", description: "Catatan harian pembelajaran" },
  AdminType { id: "analisis", name: "Analisis Hasil", icon: IconRef::CheckSquare, color: "#EC4899", description: "Analisis penilaian" },
  AdminType { id: "remedial", name: "Program Remedial", icon: IconRef::Edit, color: "#EF4444", description: "Program perbaikan nilai" },
];

const GRADES_EARLY: &[&str] = &["Kelompok Bermain", "Kelompok A (4-5 Tahun)", "Kelompok B (5-6 Tahun)"];
const GRADES_PRIMARY: &[&str] = &["1", "2", "3", "4", "5", "6"];
const GRADES_LOWER: &[&str] = &["7", "8", "9"];
const GRADES_UPPER: &[&str] = &["10", "11", "12"];

const SUBJECTS_EARLY: &[&str] = &[
  "Nilai Agama dan Budi Pekerti",
  "Jati Diri",
  "Literasi dan STEAM",
  "Tema: Diriku",
  "Tema: Keluargaku",
  "Tema: Lingkungan",
  "Tema: Binatang",
  "Tema: Tanaman",
  "Tema: Kendaraan",
  "Tema: Alam Semesta",
  "Tema: Negaraku",
  "Projek Penguatan Profil Pelajar Pancasila",
];

const SUBJECTS_PRIMARY: &[&str] = &[
  "Pendidikan Agama dan Budi Pekerti",
  "Pendidikan Pancasila",
  "Bahasa Indonesia",
  "Matematika",
  "IPAS (IPA & IPS)",
  "Bahasa Inggris",
  "Seni dan Budaya",
  "PJOK",
  "Prakarya",
];

const SUBJECTS_LOWER: &[&str] = &[
  "Pendidikan Agama dan Budi Pekerti",
  "Pendidikan Pancasila",
  "Bahasa Indonesia",
  "Matematika",
  "IPA",
  "IPS",
  "Bahasa Inggris",
  "Seni Budaya",
  "PJOK",
  "Informatika",
  "Prakarya",
];

const SUBJECTS_UPPER: &[&str] = &[
  "Pendidikan Agama dan Budi Pekerti",
  "Pendidikan Pancasila",
  "Bahasa Indonesia",
  "Matematika",
  "Bahasa Inggris",
  "Fisika",
  "Kimia",
  "Biologi",
  "Ekonomi",
  "Sosiologi",
  "Sejarah",
  "Geografi",
  "Seni Budaya",
  "PJOK",
  "Informatika",
];

const SUBJECTS_VOCATIONAL: &[&str] = &[
  "Pendidikan Agama dan Budi Pekerti",
  "Pendidikan Pancasila",
  "Bahasa Indonesia",
  "Matematika",
  "Bahasa Inggris",
  "Sejarah",
  "Seni Budaya",
  "PJOK",
  "Informatika",
  "Projek Kreatif dan Kewirausahaan",
  "Dasar-dasar Kejuruan",
  "Konsentrasi Keahlian",
];

const TOPIC_SAMPLES: &[(&str, &[&str])] = &[
  ("Matematika", &["Bilangan Bulat", "Pecahan", "Geometri", "Aljabar", "Statistika", "Trigonometri", "Kalkulus Dasar"]),
  ("Bahasa Indonesia", &["Teks Narasi", "Teks Deskripsi", "Teks Argumentasi", "Puisi", "Drama", "Karya Ilmiah"]),
  ("Pendidikan Pancasila", &["Pancasila sebagai Dasar Negara", "UUD 1945", "Bhinneka Tunggal Ika", "NKRI", "Hak dan Kewajiban"]),
  ("Pendidikan Agama dan Budi Pekerti", &["Akhlak Mulia", "Sejarah Peradaban", "Kitab Suci", "Fiqih/Hukum Agama"]),
  ("IPAS (IPA & IPS)", &["Makhluk Hidup dan Lingkungannya", "Wujud Zat dan Perubahannya", "Sejarah Daerahku", "Kegiatan Ekonomi"]),
  ("IPA", &["Sistem Organ", "Listrik Dinamis", "Pewarisan Sifat", "Bioteknologi"]),
  ("IPS", &["Interaksi Sosial", "Lembaga Sosial", "Perdagangan Internasional", "Perubahan Sosial Budaya"]),
  ("Fisika", &["Besaran dan Satuan", "Kinematika", "Dinamika", "Fluida", "Termodinamika"]),
  ("Kimia", &["Struktur Atom", "Ikatan Kimia", "Stoikiometri", "Laju Reaksi"]),
  ("Biologi", &["Sel", "Jaringan", "Metabolisme", "Genetika", "Evolusi"]),
  ("Bahasa Inggris", &["Descriptive Text", "Recount Text", "Narrative Text", "Procedure Text", "Analytical Exposition"]),
  ("Tema: Diriku", &["Identitas Diri", "Anggota Tubuh", "Kesukaanku", "Panca Indra"]),
  ("Tema: Alam Semesta", &["Benda Langit", "Gejala Alam", "Siang dan Malam"]),
  ("Tema: Binatang", &["Binatang Peliharaan", "Binatang Ternak", "Binatang Buas", "Serangga"]),
];

/// Accepts either a level id or its display label and returns the id.
pub fn canonical_level(value: &str) -> Option<&'static str> {
  LEVELS
    .iter()
    .find(|l| l.id == value || l.label == value)
    .map(|l| l.id)
}

/// Display label for prompts; unknown ids are passed through unchanged.
pub fn level_label(level: &str) -> &str {
  LEVELS
    .iter()
    .find(|l| l.id == level)
    .map(|l| l.label)
    .unwrap_or(level)
}

pub fn grade_options(level: &str) -> &'static [&'static str] {
  match level {
    "early-childhood" => GRADES_EARLY,
    "primary" => GRADES_PRIMARY,
    "lower-secondary" => GRADES_LOWER,
    "upper-secondary" | "vocational" => GRADES_UPPER,
    _ => &[],
  }
}

pub fn subject_options(level: &str) -> &'static [&'static str] {
  match level {
    "early-childhood" => SUBJECTS_EARLY,
    "primary" => SUBJECTS_PRIMARY,
    "lower-secondary" => SUBJECTS_LOWER,
    "upper-secondary" => SUBJECTS_UPPER,
    "vocational" => SUBJECTS_VOCATIONAL,
    _ => &[],
  }
}

pub fn admin_type(id: &str) -> Option<&'static AdminType> {
  ADMIN_TYPES.iter().find(|t| t.id == id)
}

/// Everything a client needs to render the setup form, in one payload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogOut {
  pub levels: Vec<LevelOut>,
  pub topic_samples: Vec<TopicSamplesOut>,
  pub document_types: &'static [DocumentType],
  pub admin_types: &'static [AdminType],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelOut {
  pub id: &'static str,
  pub label: &'static str,
  pub grades: &'static [&'static str],
  pub subjects: &'static [&'static str],
}

#[derive(Debug, Serialize)]
pub struct TopicSamplesOut {
  pub subject: &'static str,
  pub topics: &'static [&'static str],
}

pub fn catalog() -> CatalogOut {
  CatalogOut {
    levels: LEVELS
      .iter()
      .map(|l| LevelOut {
        id: l.id,
        label: l.label,
        grades: grade_options(l.id),
        subjects: subject_options(l.id),
      })
      .collect(),
    topic_samples: TOPIC_SAMPLES
      .iter()
      .map(|&(subject, topics)| TopicSamplesOut { subject, topics })
      .collect(),
    document_types: DOCUMENT_TYPES,
    admin_types: ADMIN_TYPES,
  }
}
