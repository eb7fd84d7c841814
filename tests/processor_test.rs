use std::fs;
use std::path::Path;

use repo_builder::context::RenderContext;
use repo_builder::error::Error;
use repo_builder::processor::{prepare_workdir, render_template_dir, RenderResult};
use repo_builder::walker::list_template_files;
use serde_json::json;
use tempfile::TempDir;

fn write<P: AsRef<Path>>(root: P, relative: &str, content: &[u8]) {
    let path = root.as_ref().join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn context() -> RenderContext {
    RenderContext::from_value(json!({
        "repo_name": "demo",
        "private": true,
        "services": ["api", "worker"],
    }))
}

#[test_log::test]
fn test_counts_rendered_and_copied_files() {
    let template = TempDir::new().unwrap();
    write(&template, "README.md", b"# {{ repo_name }}\n");
    write(&template, "src/config.txt", b"{% if private %}private{% endif %}\n");
    write(&template, "LICENSE", b"MIT\n");
    write(&template, "src/main.rs", b"fn main() { println!(\"{}\", 1); }\n");
    write(&template, "logo.png", &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0xff]);
    let output = TempDir::new().unwrap();

    let result = render_template_dir(template.path(), output.path(), &context()).unwrap();

    assert_eq!(result, RenderResult { rendered_files: 2, copied_files: 3 });
    assert_eq!(fs::read_to_string(output.path().join("README.md")).unwrap(), "# demo\n");
    assert_eq!(
        fs::read_to_string(output.path().join("src/config.txt")).unwrap(),
        "private\n"
    );
}

#[test]
fn test_rendering_twice_is_deterministic() {
    let template = TempDir::new().unwrap();
    write(&template, "a/b/c.txt", b"{% for s in services %}{{ s }}\n{% endfor %}");
    write(&template, "z.txt", b"plain\r\n");
    write(&template, "bin/data.bin", &[0, 159, 146, 150, 0, 255]);
    write(&template, "empty", b"");

    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();
    render_template_dir(template.path(), first.path(), &context()).unwrap();
    render_template_dir(template.path(), second.path(), &context()).unwrap();

    assert!(!dir_diff::is_different(first.path(), second.path()).unwrap());
}

#[test]
fn test_output_does_not_depend_on_creation_order() {
    let names = ["m.txt", "a.txt", "z/y.txt", "b/a.txt", "B.txt", "a b.txt"];

    let forward = TempDir::new().unwrap();
    for name in names {
        write(&forward, name, format!("{name}: {{{{ repo_name }}}}\n").as_bytes());
    }
    let backward = TempDir::new().unwrap();
    for name in names.iter().rev() {
        write(&backward, name, format!("{name}: {{{{ repo_name }}}}\n").as_bytes());
    }

    let listed_forward = list_template_files(forward.path()).unwrap();
    let listed_backward = list_template_files(backward.path()).unwrap();
    assert_eq!(listed_forward, listed_backward);
    let order: Vec<&str> = listed_forward.iter().map(|p| p.as_str()).collect();
    assert_eq!(order, vec!["B.txt", "a b.txt", "a.txt", "b/a.txt", "m.txt", "z/y.txt"]);

    let out_forward = TempDir::new().unwrap();
    let out_backward = TempDir::new().unwrap();
    render_template_dir(forward.path(), out_forward.path(), &context()).unwrap();
    render_template_dir(backward.path(), out_backward.path(), &context()).unwrap();
    assert!(!dir_diff::is_different(out_forward.path(), out_backward.path()).unwrap());
}

#[test]
fn test_binary_files_are_copied_exactly() {
    let template = TempDir::new().unwrap();
    let payload: Vec<u8> = (0..=255u8).chain(b"{{ repo_name }}".iter().copied()).collect();
    write(&template, "blob.bin", &payload);
    write(&template, "nul.dat", b"\0\0\0");
    write(&template, "empty.bin", b"");
    let output = TempDir::new().unwrap();

    let result = render_template_dir(template.path(), output.path(), &context()).unwrap();

    assert_eq!(result, RenderResult { rendered_files: 0, copied_files: 3 });
    assert_eq!(fs::read(output.path().join("blob.bin")).unwrap(), payload);
    assert_eq!(fs::read(output.path().join("nul.dat")).unwrap(), b"\0\0\0");
    assert_eq!(fs::read(output.path().join("empty.bin")).unwrap(), b"");
}

#[test]
fn test_marker_free_text_keeps_crlf() {
    let template = TempDir::new().unwrap();
    write(&template, "notes.txt", b"line one\r\nline two\r\n");
    let output = TempDir::new().unwrap();

    let result = render_template_dir(template.path(), output.path(), &context()).unwrap();

    assert_eq!(result.copied_files, 1);
    assert_eq!(fs::read(output.path().join("notes.txt")).unwrap(), b"line one\r\nline two\r\n");
}

#[test]
fn test_rendered_text_uses_lf_only() {
    let template = TempDir::new().unwrap();
    write(&template, "notes.txt", b"name: {{ repo_name }}\r\nline two\r\nold mac\rend\r\n");
    let output = TempDir::new().unwrap();

    let result = render_template_dir(template.path(), output.path(), &context()).unwrap();

    assert_eq!(result.rendered_files, 1);
    assert_eq!(
        fs::read(output.path().join("notes.txt")).unwrap(),
        b"name: demo\nline two\nold mac\nend\n"
    );
}

#[test]
fn test_missing_variable_fails_without_writing_the_file() {
    let template = TempDir::new().unwrap();
    write(&template, "OWNERS.md", b"Name: {{ repo_name }}\nOwner: {{ owner }}\n");
    let output = TempDir::new().unwrap();
    let context = RenderContext::from_value(json!({"repo_name": "demo"}));

    let result = render_template_dir(template.path(), output.path(), &context);

    match result {
        Err(Error::SubstitutionFailure { path, variable, .. }) => {
            assert_eq!(path, "OWNERS.md");
            assert_eq!(variable.as_deref(), Some("owner"));
        }
        other => panic!("Expected SubstitutionFailure, got {other:?}"),
    }
    assert!(!output.path().join("OWNERS.md").exists());
}

#[test]
fn test_first_failure_aborts_the_run() {
    let template = TempDir::new().unwrap();
    write(&template, "a.txt", b"first\n");
    write(&template, "b.txt", b"{{ missing }}\n");
    write(&template, "c.txt", b"{{ also_missing }}\n");
    write(&template, "d/e.txt", b"later\n");
    let output = TempDir::new().unwrap();

    let result = render_template_dir(template.path(), output.path(), &context());

    match result {
        Err(Error::SubstitutionFailure { path, .. }) => assert_eq!(path, "b.txt"),
        other => panic!("Expected SubstitutionFailure, got {other:?}"),
    }
    assert!(output.path().join("a.txt").exists());
    assert!(!output.path().join("b.txt").exists());
    assert!(!output.path().join("c.txt").exists());
    assert!(!output.path().join("d").exists());
}

#[test]
fn test_malformed_markers_fail_with_path() {
    let template = TempDir::new().unwrap();
    write(&template, "src/broken.txt", b"{% for x in %}\n");
    let output = TempDir::new().unwrap();

    let result = render_template_dir(template.path(), output.path(), &context());

    match result {
        Err(Error::SubstitutionFailure { path, variable, .. }) => {
            assert_eq!(path, "src/broken.txt");
            assert_eq!(variable, None);
        }
        other => panic!("Expected SubstitutionFailure, got {other:?}"),
    }
}

#[test]
fn test_invalid_template_root_fails_before_output() {
    let parent = TempDir::new().unwrap();
    let output = parent.path().join("out");

    let missing = render_template_dir(parent.path().join("nope"), &output, &context());
    assert!(matches!(missing, Err(Error::InvalidTemplateRoot { .. })));

    write(&parent, "file.txt", b"x");
    let not_dir = render_template_dir(parent.path().join("file.txt"), &output, &context());
    assert!(matches!(not_dir, Err(Error::InvalidTemplateRoot { .. })));

    assert!(!output.exists());
}

#[test]
fn test_existing_destination_content_is_kept() {
    let template = TempDir::new().unwrap();
    write(&template, "a.txt", b"{{ repo_name }}");
    let output = TempDir::new().unwrap();
    write(&output, "keep.txt", b"mine");
    write(&output, "a.txt", b"stale");

    render_template_dir(template.path(), output.path(), &context()).unwrap();

    assert_eq!(fs::read(output.path().join("keep.txt")).unwrap(), b"mine");
    assert_eq!(fs::read(output.path().join("a.txt")).unwrap(), b"demo");
}

#[test]
fn test_empty_directories_are_not_listed() {
    let template = TempDir::new().unwrap();
    fs::create_dir_all(template.path().join("empty/nested")).unwrap();
    write(&template, "deep/er/file.txt", b"x");
    let output = TempDir::new().unwrap();

    let result = render_template_dir(template.path(), output.path(), &context()).unwrap();

    assert_eq!(result, RenderResult { rendered_files: 0, copied_files: 1 });
    assert!(output.path().join("deep/er/file.txt").is_file());
    assert!(!output.path().join("empty").exists());
}

#[cfg(unix)]
mod unix {
    use super::*;
    use std::os::unix::fs::{symlink, PermissionsExt};

    fn mode(path: &Path) -> u32 {
        fs::metadata(path).unwrap().permissions().mode() & 0o7777
    }

    #[test]
    fn test_permission_bits_are_preserved() {
        let template = TempDir::new().unwrap();
        write(&template, "scripts/run.sh", b"#!/bin/sh\necho {{ repo_name }}\n");
        write(&template, "scripts/plain.sh", b"#!/bin/sh\necho hi\n");
        write(&template, "readonly.txt", b"ro");
        fs::set_permissions(template.path().join("scripts/run.sh"), fs::Permissions::from_mode(0o755))
            .unwrap();
        fs::set_permissions(
            template.path().join("scripts/plain.sh"),
            fs::Permissions::from_mode(0o750),
        )
        .unwrap();
        fs::set_permissions(template.path().join("readonly.txt"), fs::Permissions::from_mode(0o444))
            .unwrap();
        let output = TempDir::new().unwrap();

        let result = render_template_dir(template.path(), output.path(), &context()).unwrap();

        assert_eq!(result, RenderResult { rendered_files: 1, copied_files: 2 });
        assert_eq!(mode(&output.path().join("scripts/run.sh")), 0o755);
        assert_eq!(mode(&output.path().join("scripts/plain.sh")), 0o750);
        assert_eq!(mode(&output.path().join("readonly.txt")), 0o444);
    }

    #[test]
    fn test_symlinks_are_followed() {
        let outside = TempDir::new().unwrap();
        write(&outside, "target.txt", b"hello {{ repo_name }}");
        write(&outside, "shared/asset.txt", b"asset");
        let template = TempDir::new().unwrap();
        symlink(outside.path().join("target.txt"), template.path().join("link.txt")).unwrap();
        symlink(outside.path().join("shared"), template.path().join("shared")).unwrap();
        let output = TempDir::new().unwrap();

        let result = render_template_dir(template.path(), output.path(), &context()).unwrap();

        assert_eq!(result, RenderResult { rendered_files: 1, copied_files: 1 });
        assert_eq!(fs::read_to_string(output.path().join("link.txt")).unwrap(), "hello demo");
        assert_eq!(fs::read(output.path().join("shared/asset.txt")).unwrap(), b"asset");
        assert!(!fs::symlink_metadata(output.path().join("link.txt")).unwrap().is_symlink());
    }

    #[test]
    fn test_dangling_symlink_is_unreadable() {
        let template = TempDir::new().unwrap();
        symlink(template.path().join("missing.txt"), template.path().join("broken.txt")).unwrap();
        let output = TempDir::new().unwrap();

        let result = render_template_dir(template.path(), output.path(), &context());

        match result {
            Err(Error::UnreadableSourceFile { path, .. }) => assert_eq!(path, "broken.txt"),
            other => panic!("Expected UnreadableSourceFile, got {other:?}"),
        }
    }

    #[test]
    fn test_walk_errors_surface_in_canonical_order() {
        let template = TempDir::new().unwrap();
        write(&template, "a.txt", b"plain");
        write(&template, "b.txt", b"{{ missing }}");
        symlink(template.path().join("gone.txt"), template.path().join("z_link.txt")).unwrap();
        let output = TempDir::new().unwrap();

        let result = render_template_dir(template.path(), output.path(), &context());

        match result {
            Err(Error::SubstitutionFailure { path, .. }) => assert_eq!(path, "b.txt"),
            other => panic!("Expected SubstitutionFailure, got {other:?}"),
        }
        assert_eq!(fs::read(output.path().join("a.txt")).unwrap(), b"plain");
        assert!(!output.path().join("z_link.txt").exists());
    }

    #[test]
    fn test_first_dangling_link_in_order_is_reported() {
        let template = TempDir::new().unwrap();
        write(&template, "m.txt", b"middle");
        for name in ["z_link.txt", "c_link.txt", "q_link.txt"] {
            symlink(template.path().join("gone.txt"), template.path().join(name)).unwrap();
        }
        let output = TempDir::new().unwrap();

        let result = render_template_dir(template.path(), output.path(), &context());

        match result {
            Err(Error::UnreadableSourceFile { path, .. }) => assert_eq!(path, "c_link.txt"),
            other => panic!("Expected UnreadableSourceFile, got {other:?}"),
        }
        assert!(!output.path().join("m.txt").exists());

        let listed = list_template_files(template.path());
        assert!(
            matches!(listed, Err(Error::UnreadableSourceFile { path, .. }) if path == "c_link.txt")
        );
    }
}

#[test]
fn test_prepare_workdir() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path();

    // Non-existent directory is created
    let new_dir = path.join("generated/demo");
    assert_eq!(prepare_workdir(&new_dir, false).unwrap(), new_dir);
    assert!(new_dir.is_dir());

    // Empty directory is accepted
    assert!(prepare_workdir(&new_dir, false).is_ok());

    // Non-empty directory needs overwrite
    assert!(matches!(prepare_workdir(path, false), Err(Error::WorkdirNotEmptyError { .. })));
    assert!(prepare_workdir(path, true).is_ok());
}
