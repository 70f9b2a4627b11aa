use chrono::{Duration, Utc};
use examprep_core::DocumentId;
use examprep_model::{
    Admin, Announcement, AnnouncementKind, Audience, Priority, Role, StudyMaterial, User,
};
use examprep_store::Filter;
use rand::distributions::Alphanumeric;
use rand::Rng;
use tracing::{info, warn};

use crate::auth::{hash_password, DEMO_STUDENT_EMAIL};
use crate::error::ApiFailure;
use crate::AppState;

/// `507f1f77bcf86cd799439011`, the demo student's fixed id.
fn demo_student_id() -> DocumentId {
    DocumentId::from_parts(0x507f_1f77, 0xbcf8_6cd7_9943_9011)
}

fn demo_student_record() -> Result<User, ApiFailure> {
    let mut user = User::new(
        "Demo Student",
        DEMO_STUDENT_EMAIL,
        Some("9999999999".to_string()),
        Utc::now(),
    )?;
    user.id = demo_student_id();
    user.is_email_verified = true;
    user.is_phone_verified = true;
    user.city = Some("Demo City".to_string());
    user.gender = Some("Male".to_string());
    user.dob = Some("1995-01-01".to_string());
    user.selected_category = Some("CAT".to_string());
    user.selected_exam = Some("CAT 2025".to_string());
    Ok(user)
}

/// The demo student, created on first use.
pub(crate) async fn ensure_demo_student(state: &AppState) -> Result<User, ApiFailure> {
    let users = state.repo::<User>();
    if let Some(user) = users
        .find_one(&Filter::all().eq("email", DEMO_STUDENT_EMAIL))
        .await?
    {
        return Ok(user);
    }
    let user = demo_student_record()?;
    if let Some(existing) = users.get(&user.id).await? {
        return Ok(existing);
    }
    users.insert(&user).await?;
    info!(user_id = %user.id, "demo student created");
    Ok(user)
}

async fn first_admin(state: &AppState) -> Result<Admin, ApiFailure> {
    let admins = state.repo::<Admin>();
    let mut existing = admins.find(&Filter::all(), None).await?;
    existing.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    if let Some(admin) = existing.into_iter().next() {
        return Ok(admin);
    }
    let password: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(20)
        .map(char::from)
        .collect();
    let mut admin = Admin::new(
        "admin@sample.com",
        hash_password(&password)?,
        Role::Admin,
        Utc::now(),
    )?;
    admin.name = Some("Sample Admin".to_string());
    admins.insert(&admin).await?;
    warn!(
        email = %admin.email,
        password = %password,
        "sample admin created; change this password"
    );
    Ok(admin)
}

type MaterialRow = (
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    &'static [&'static str],
    u32,
);

const SAMPLE_MATERIALS: &[MaterialRow] = &[
    (
        "Quantitative Aptitude Formula Book",
        "Complete formula book covering Arithmetic, Algebra, Geometry and Number Systems.",
        "Quantitative Aptitude",
        "PDF",
        "QA_Formula_Book.pdf",
        "5.2 MB",
        &["formulas", "QA", "reference", "mathematics"],
        1234,
    ),
    (
        "Verbal Ability Video Lectures Series",
        "Video lectures on Reading Comprehension, Para Jumbles, Critical Reasoning and Grammar.",
        "Verbal Ability",
        "Video",
        "VA_Video_Lectures.mp4",
        "850 MB",
        &["video", "verbal", "lectures", "comprehension"],
        856,
    ),
    (
        "Data Interpretation Practice Sets",
        "Fifty practice sets covering Tables, Charts, Graphs and Caselets.",
        "Data Interpretation",
        "Practice Sets",
        "DI_Practice_Sets.pdf",
        "3.8 MB",
        &["practice", "DI", "charts", "graphs"],
        945,
    ),
    (
        "Logical Reasoning Shortcuts & Tricks",
        "Time-saving shortcuts for Logical Reasoning questions.",
        "Logical Reasoning",
        "Notes",
        "LR_Shortcuts.pdf",
        "2.1 MB",
        &["shortcuts", "tricks", "logical reasoning"],
        672,
    ),
    (
        "CAT Previous Year Papers (2010-2023)",
        "Previous year CAT papers with detailed solutions.",
        "All Subjects",
        "PDF",
        "CAT_Previous_Papers.pdf",
        "12.5 MB",
        &["previous papers", "CAT", "solutions", "practice"],
        2156,
    ),
    (
        "Reading Comprehension Passages",
        "High-quality passages on varied topics with explanations.",
        "Verbal Ability",
        "PDF",
        "RC_Passages.pdf",
        "7.3 MB",
        &["reading comprehension", "passages", "verbal"],
        789,
    ),
    (
        "Quantitative Aptitude Video Solutions",
        "Step-by-step video solutions for hard QA problems.",
        "Quantitative Aptitude",
        "Video",
        "QA_Video_Solutions.mp4",
        "1.2 GB",
        &["video solutions", "QA", "problem solving"],
        543,
    ),
    (
        "General Knowledge Current Affairs",
        "Current affairs digest for competitive exams.",
        "General Knowledge",
        "PDF",
        "GK_Current_Affairs.pdf",
        "4.6 MB",
        &["current affairs", "GK", "updates"],
        421,
    ),
];

fn sample_materials(admin: &DocumentId) -> Vec<StudyMaterial> {
    let now = Utc::now();
    SAMPLE_MATERIALS
        .iter()
        .map(
            |&(title, description, subject, material_type, file_name, file_size, tags, downloads)| {
                StudyMaterial {
                    id: DocumentId::generate(),
                    title: title.to_string(),
                    description: description.to_string(),
                    subject: subject.to_string(),
                    material_type: material_type.to_string(),
                    file_name: file_name.to_string(),
                    file_size: file_size.to_string(),
                    tags: tags.iter().map(|t| (*t).to_string()).collect(),
                    download_count: downloads,
                    course_id: None,
                    uploaded_by: Some(admin.clone()),
                    is_active: true,
                    created_at: now,
                }
            },
        )
        .collect()
}

fn sample_announcements(admin: &DocumentId) -> Vec<Announcement> {
    let now = Utc::now();
    let entry = |title: &str,
                 content: &str,
                 kind: AnnouncementKind,
                 priority: Priority,
                 target_audience: Audience,
                 is_pinned: bool,
                 expires_in_days: Option<i64>| Announcement {
        id: DocumentId::generate(),
        title: title.to_string(),
        content: content.to_string(),
        kind,
        priority,
        target_audience,
        is_pinned,
        expiry_date: expires_in_days.map(|days| now + Duration::days(days)),
        is_active: true,
        created_by: Some(admin.clone()),
        created_at: now,
    };
    vec![
        entry(
            "New Mock Test Series Released!",
            "The latest CAT mock test series is live with updated patterns and difficulty levels.",
            AnnouncementKind::Important,
            Priority::High,
            Audience::Students,
            true,
            None,
        ),
        entry(
            "Study Materials Updated",
            "Quantitative Aptitude formulas and shortcuts now cover advanced topics.",
            AnnouncementKind::Update,
            Priority::Medium,
            Audience::Students,
            false,
            None,
        ),
        entry(
            "Upcoming Live Session",
            "Doubt clearing session on Data Interpretation this Friday at 7 PM.",
            AnnouncementKind::Reminder,
            Priority::Medium,
            Audience::Students,
            false,
            Some(7),
        ),
        entry(
            "Performance Reports Available",
            "Your monthly performance report is available in the Analysis section.",
            AnnouncementKind::Update,
            Priority::Low,
            Audience::Students,
            false,
            None,
        ),
        entry(
            "New Feature: Question Recommendations",
            "Practice questions are now suggested from your weak areas.",
            AnnouncementKind::General,
            Priority::Medium,
            Audience::All,
            false,
            None,
        ),
        entry(
            "Scheduled Maintenance",
            "The platform will be under maintenance on Sunday from 2 AM to 4 AM IST.",
            AnnouncementKind::Maintenance,
            Priority::High,
            Audience::All,
            false,
            Some(3),
        ),
    ]
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub materials: usize,
    pub announcements: usize,
}

/// Fills empty study-material and announcement collections with samples.
pub async fn seed_demo_data(state: &AppState) -> Result<SeedReport, ApiFailure> {
    let mut report = SeedReport::default();
    let materials = state.repo::<StudyMaterial>();
    let announcements = state.repo::<Announcement>();
    let need_materials = materials.count(&Filter::all()).await? == 0;
    let need_announcements = announcements.count(&Filter::all()).await? == 0;
    if !need_materials && !need_announcements {
        info!("demo data already present");
        return Ok(report);
    }

    let admin = first_admin(state).await?;
    if need_materials {
        for m in sample_materials(&admin.id) {
            materials.insert(&m).await?;
            report.materials += 1;
        }
    }
    if need_announcements {
        for a in sample_announcements(&admin.id) {
            announcements.insert(&a).await?;
            report.announcements += 1;
        }
    }
    info!(
        materials = report.materials,
        announcements = report.announcements,
        "demo data seeded"
    );
    Ok(report)
}
