//! Terminal rendering
//!
//! Plain aligned tables on stdout, notices on stderr.

use crate::models::{Course, CourseModule, Lesson, OrderUpdate, Student, User};
use crate::services::{format_date, format_price, image_url, Notice, NoticeLevel, Notifier, ServiceError};

/// Print and drop every queued notice; returns how many were errors
pub fn notices(notifier: &Notifier) -> usize {
    let drained = notifier.drain();
    for notice in &drained {
        eprintln!("{}", notice_line(notice));
    }
    drained.iter().filter(|n| n.level == NoticeLevel::Error).count()
}

fn notice_line(notice: &Notice) -> String {
    let mark = match notice.level {
        NoticeLevel::Success => "✓",
        NoticeLevel::Error => "✗",
        NoticeLevel::Info => "•",
    };
    format!("{} {}", mark, notice.message)
}

/// Report an error nobody turned into a notice
pub fn failure(err: &anyhow::Error) {
    match err.downcast_ref::<ServiceError>() {
        Some(e) => eprintln!("✗ {}", e.user_message()),
        None => eprintln!("✗ {:#}", err),
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

fn course_row(course: &Course) -> String {
    format!(
        "{:>3}  {:>5}  {:<40}  {:>12}  {:<11}  {}",
        course.order,
        course.id,
        truncate(&course.title, 40),
        format_price(course.price),
        course.status,
        format_date(&course.updated_at, false),
    )
}

pub fn courses(list: &[Course]) {
    if list.is_empty() {
        println!("No courses yet. Create one with `course create`.");
        return;
    }
    println!(
        "{:>3}  {:>5}  {:<40}  {:>12}  {:<11}  {}",
        "#", "ID", "TITLE", "PRICE", "STATUS", "UPDATED"
    );
    for course in list {
        println!("{}", course_row(course));
    }
}

pub fn course(course: &Course, image_base_url: &str) {
    println!("{} (#{})", course.title, course.id);
    println!("  price:         {}", format_price(course.price));
    println!("  duration:      {}", course.duration);
    println!("  status:        {}", course.status);
    println!("  cover:         {}", image_url(image_base_url, &course.image));
    println!("  created:       {}", format_date(&course.created_at, true));
    println!("  updated:       {}", format_date(&course.updated_at, true));
    println!("  description:   {}", course.description);
    println!("  highlights:    {}", course.highlights);
    println!("  outcomes:      {}", course.outcomes);
    println!("  prerequisites: {}", course.prerequisites);
}

fn module_row(module: &CourseModule) -> String {
    format!(
        "{:>3}  {:>5}  {:<50}  {}",
        module.order,
        module.id,
        truncate(&module.title, 50),
        module.lessons.len()
    )
}

pub fn modules(list: &[CourseModule]) {
    if list.is_empty() {
        println!("No modules yet.");
        return;
    }
    println!("{:>3}  {:>5}  {:<50}  {}", "#", "ID", "TITLE", "LESSONS");
    for module in list {
        println!("{}", module_row(module));
    }
}

fn lesson_row(lesson: &Lesson) -> String {
    format!(
        "{:>3}  {:>5}  {:<40}  {:<5}  {:<6}  {}",
        lesson.order,
        lesson.id,
        truncate(&lesson.title, 40),
        lesson.kind(),
        lesson.visibility(),
        lesson.public_url().unwrap_or("-"),
    )
}

pub fn lessons(list: &[Lesson]) {
    if list.is_empty() {
        println!("No lessons yet.");
        return;
    }
    println!(
        "{:>3}  {:>5}  {:<40}  {:<5}  {:<6}  {}",
        "#", "ID", "TITLE", "TYPE", "ACCESS", "URL"
    );
    for lesson in list {
        println!("{}", lesson_row(lesson));
    }
}

pub fn lesson(lesson: &Lesson) {
    println!("{} (#{})", lesson.title, lesson.id);
    println!("  module:     {}", lesson.module_id);
    println!("  position:   {}", lesson.order);
    println!("  type:       {}", lesson.kind());
    println!("  visibility: {}", lesson.visibility());
    if let Some(url) = lesson.public_url() {
        println!("  url:        {}", url);
    }
    if !lesson.tasks.is_empty() {
        println!("  tasks:      {}", lesson.tasks.len());
    }
}

pub fn students(list: &[Student]) {
    if list.is_empty() {
        println!("No students enrolled yet.");
        return;
    }
    println!("{:>5}  {:<30}  {:<35}  {}", "ID", "NAME", "EMAIL", "MOBILE");
    for student in list {
        println!(
            "{:>5}  {:<30}  {:<35}  {}",
            student.id,
            truncate(&student.name, 30),
            truncate(&student.email, 35),
            student.mobile
        );
    }
}

pub fn user(user: &User) {
    println!("{} <{}>", user.name, user.email);
    if !user.roles.is_empty() {
        println!("  roles: {}", user.roles.join(", "));
    }
}

pub fn pending(label: &str, batch: &[OrderUpdate]) {
    let pairs: Vec<String> = batch.iter().map(|u| format!("{}→{}", u.id, u.order)).collect();
    println!("{}: {}", label, pairs.join(", "));
}
