//! Shared fixture: a small Go project history, ten revisions, all by "lz"

#![allow(dead_code)]

use svnlens_core::{DiskEngine, RepositoryEngine, svn_props};
use tempfile::TempDir;

pub const AUTHOR: &str = "lz";

/// Base timestamp of revision 1
pub const T0: i64 = 1_404_000_000;

pub const MAKEFILE_HEADER: &str = "# Make file to build newbc project\n";

const MAKEFILE_BODY: &str = "export GOPATH := $(CURDIR)
export LIBGIT_INSTALL_PREFIX := $(CURDIR)/vendor/libgit2_bin
export LIBGIT_SRC_PATH := $(CURDIR)/vendor/libgit2
export PKG_CONFIG_PATH := $(LIBGIT_INSTALL_PREFIX)/lib/pkgconfig

.PHONY: all build test clean libgit2

all: build

libgit2:
\tmkdir -p $(LIBGIT_SRC_PATH)/build
\tcd $(LIBGIT_SRC_PATH)/build && cmake -DCMAKE_INSTALL_PREFIX=$(LIBGIT_INSTALL_PREFIX) -DBUILD_SHARED_LIBS=OFF ..
\tcd $(LIBGIT_SRC_PATH)/build && cmake --build . --target install

build: libgit2
\tgo build -o bin/newbc ./src

test:
\tgo test ./src/...

clean:
\trm -rf bin $(LIBGIT_SRC_PATH)/build $(LIBGIT_INSTALL_PREFIX)
";

/// Makefile as first committed in r2
pub fn makefile_r2() -> String {
    MAKEFILE_BODY.to_string()
}

/// r4: verbose tests plus a trailing banner sized so that r5 is 1279 bytes
pub fn makefile_r4() -> String {
    let mut body = MAKEFILE_BODY.replace("go test ./src/...", "go test -v ./src/...");
    let target = 1279 - MAKEFILE_HEADER.len();
    // "# " + dashes + "\n"
    let dashes = target - body.len() - 3;
    body.push_str("# ");
    body.push_str(&"-".repeat(dashes));
    body.push('\n');
    body
}

/// r5: r4 with the header comment prepended
pub fn makefile_r5() -> String {
    format!("{}{}", MAKEFILE_HEADER, makefile_r4())
}

/// r9: whitespace-only edit of r5
pub fn makefile_r9() -> String {
    makefile_r5().replace("all: build\n", "all:  build\n")
}

pub const MAIN_GO_R3: &str = "package main

import \"fmt\"

func main() {
\tfmt.Println(\"newbc\")
}
";

pub const MAIN_GO_R8: &str = "package main

import (
\t\"fmt\"
\t\"os\"
)

func main() {
\tfmt.Println(\"newbc\", os.Args[1:])
}
";

pub const PLAY_PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR\0\0\0\x10\0\0\0\x10\x08\x06\0\0\0\x1f\xf3\xffa\0\0\0\0IEND\xaeB`\x82";

/// Build the fixture repository in a fresh temporary directory
pub fn fixture() -> TempDir {
    let tmp = TempDir::new().unwrap();
    build_history(&mut DiskEngine::create(tmp.path()).unwrap());
    tmp
}

pub fn build_history(engine: &mut impl RepositoryEngine) {
    let mut at = T0;
    let mut txn = engine.begin_txn(AUTHOR, "Create trunk").unwrap().at(at);
    txn.mkdir("trunk").unwrap();
    txn.commit().unwrap();
    at += 3600;

    let mut txn = engine.begin_txn(AUTHOR, "Add Makefile").unwrap().at(at);
    txn.add_file("trunk/Makefile", makefile_r2()).unwrap();
    txn.commit().unwrap();
    at += 3600;

    let mut txn = engine.begin_txn(AUTHOR, "Add main program").unwrap().at(at);
    txn.mkdir("trunk/src").unwrap();
    txn.add_file("trunk/src/main.go", MAIN_GO_R3).unwrap();
    txn.commit().unwrap();
    at += 3600;

    let mut txn = engine.begin_txn(AUTHOR, "Verbose tests").unwrap().at(at);
    txn.add_file("trunk/Makefile", makefile_r4()).unwrap();
    txn.commit().unwrap();
    at += 3600;

    let mut txn = engine.begin_txn(AUTHOR, "Describe Makefile").unwrap().at(at);
    txn.add_file("trunk/Makefile", makefile_r5()).unwrap();
    txn.commit().unwrap();
    at += 3600;

    let mut txn = engine.begin_txn(AUTHOR, "Add TODO").unwrap().at(at);
    txn.add_file("trunk/TODO", "Readme\n").unwrap();
    txn.commit().unwrap();
    at += 3600;

    let mut txn = engine.begin_txn(AUTHOR, "Add play icon").unwrap().at(at);
    txn.mkdir("trunk/images").unwrap();
    txn.add_file("trunk/images/play.png", PLAY_PNG).unwrap();
    txn.commit().unwrap();
    at += 3600;

    let mut txn = engine.begin_txn(AUTHOR, "Print arguments").unwrap().at(at);
    txn.add_file("trunk/src/main.go", MAIN_GO_R8).unwrap();
    txn.commit().unwrap();
    at += 3600;

    let mut txn = engine.begin_txn(AUTHOR, "White space change").unwrap().at(at);
    txn.add_file("trunk/Makefile", makefile_r9()).unwrap();
    txn.commit().unwrap();
    at += 3600;

    let mut txn = engine.begin_txn(AUTHOR, "Link images").unwrap().at(at);
    txn.add_file("trunk/img", "link images").unwrap();
    txn.set_prop("trunk/img", svn_props::SPECIAL, svn_props::BOOLEAN_VALUE).unwrap();
    assert_eq!(txn.commit().unwrap(), 10);
}
