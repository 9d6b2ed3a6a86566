use {
    gtk::{glib, pango, prelude::*},
    log::{error, trace},
    std::{
        cell::RefCell,
        rc::{Rc, Weak},
    },
};

use crate::{
    backend::Backend,
    choices::Choices,
    settings::SettingsStore,
};

const COLUMN_OUTPUT_NAME: u32 = 0;
const COLUMN_OUTPUT_ICON_NAME: u32 = 1;
const COLUMN_OUTPUT_ID: u32 = 2;

const COLUMN_COMBO_NAME: u32 = 0;
const COLUMN_COMBO_VALUE: u32 = 1;

pub const RESPONSE_APPLY: gtk::ResponseType = gtk::ResponseType::Other(1);
pub const RESPONSE_RELOAD: gtk::ResponseType = gtk::ResponseType::Other(2);

pub struct DisplayDialog {
    pub dialog: gtk::Dialog,
    outputs: gtk::TreeView,
    resolution: gtk::ComboBox,
    refresh_rate: gtk::ComboBox,
    rotation: gtk::ComboBox,
    backend: RefCell<Box<dyn Backend>>,
    store: Box<dyn SettingsStore>,
    scheme: String,
}

fn combo_box_new() -> gtk::ComboBox {
    let store = gtk::ListStore::new(&[glib::Type::STRING, glib::Type::U32]);
    let combobox = gtk::ComboBox::with_model(&store);
    let renderer = gtk::CellRendererText::new();
    combobox.clear();
    combobox.pack_start(&renderer, true);
    combobox.add_attribute(&renderer, "text", COLUMN_COMBO_NAME as i32);
    combobox
}

fn combo_box_value(combobox: &gtk::ComboBox) -> Option<u32> {
    let iter = combobox.active_iter()?;
    let model = combobox.model()?;
    Some(model.value(&iter, COLUMN_COMBO_VALUE as i32).get::<u32>().expect("Failed to get value from TreeModel"))
}

/// Refills the combo box. Clearing and selecting both emit `changed`.
fn combo_box_fill(combobox: &gtk::ComboBox, choices: &Choices) {
    let store = match combobox
        .model()
        .and_then(|model| model.downcast::<gtk::ListStore>().ok())
    {
        Some(store) => store,
        None => return,
    };
    store.clear();
    for choice in &choices.entries {
        store.insert_with_values(
            None,
            &[
                (COLUMN_COMBO_NAME, &choice.name),
                (COLUMN_COMBO_VALUE, &choice.value),
            ],
        );
    }
    combobox.set_active(choices.active.map(|index| index as u32));
    combobox.set_sensitive(!choices.is_empty());
}

fn outputs_view_new() -> gtk::TreeView {
    let treeview = gtk::TreeView::builder()
        .headers_visible(false)
        .tooltip_column(COLUMN_OUTPUT_NAME as i32)
        .build();

    let column = gtk::TreeViewColumn::new();
    let icon = gtk::CellRendererPixbuf::builder()
        .icon_name("video-display")
        .stock_size(glib::translate::IntoGlib::into_glib(gtk::IconSize::Dnd) as u32)
        .build();
    TreeViewColumnExt::pack_start(&column, &icon, false);
    TreeViewColumnExt::add_attribute(&column, &icon, "icon-name", COLUMN_OUTPUT_ICON_NAME as i32);
    treeview.append_column(&column);

    let column = gtk::TreeViewColumn::new();
    let text = gtk::CellRendererText::builder()
        .ellipsize(pango::EllipsizeMode::End)
        .build();
    TreeViewColumnExt::pack_start(&column, &text, true);
    TreeViewColumnExt::add_attribute(&column, &text, "text", COLUMN_OUTPUT_NAME as i32);
    treeview.append_column(&column);

    treeview.selection().set_mode(gtk::SelectionMode::Single);
    treeview
}

fn labelled(grid: &gtk::Grid, row: i32, label: &str, combobox: &gtk::ComboBox) {
    let label = gtk::Label::builder()
        .label(label)
        .use_underline(true)
        .mnemonic_widget(combobox)
        .xalign(0.0)
        .build();
    grid.attach(&label, 0, row, 1, 1);
    grid.attach(combobox, 1, row, 1, 1);
}

impl DisplayDialog {
    pub fn new(
        backend: Box<dyn Backend>,
        store: Box<dyn SettingsStore>,
        scheme: &str,
    ) -> Rc<Self> {
        let dialog = gtk::Dialog::builder()
            .title("Display")
            .icon_name("video-display")
            .build();
        dialog.add_button("_Reload", RESPONSE_RELOAD);
        dialog.add_button("_Apply", RESPONSE_APPLY);
        dialog.add_button("_Close", gtk::ResponseType::Close);

        let outputs = outputs_view_new();
        let resolution = combo_box_new();
        let refresh_rate = combo_box_new();
        let rotation = combo_box_new();

        let scrolled = gtk::ScrolledWindow::builder()
            .hscrollbar_policy(gtk::PolicyType::Never)
            .shadow_type(gtk::ShadowType::EtchedIn)
            .width_request(180)
            .build();
        scrolled.add(&outputs);

        let grid = gtk::Grid::builder()
            .row_spacing(6)
            .column_spacing(12)
            .hexpand(true)
            .build();
        labelled(&grid, 0, "_Resolution:", &resolution);
        labelled(&grid, 1, "Refresh _rate:", &refresh_rate);
        labelled(&grid, 2, "R_otation:", &rotation);

        let hbox = gtk::Box::builder()
            .orientation(gtk::Orientation::Horizontal)
            .spacing(12)
            .border_width(6)
            .build();
        hbox.pack_start(&scrolled, false, true, 0);
        hbox.pack_start(&grid, true, true, 0);
        dialog.content_area().pack_start(&hbox, true, true, 0);

        let this = Rc::new(DisplayDialog {
            dialog,
            outputs,
            resolution,
            refresh_rate,
            rotation,
            backend: RefCell::new(backend),
            store,
            scheme: scheme.to_owned(),
        });
        this.connect_signals();
        this.populate_outputs();
        this
    }

    fn connect_signals(self: &Rc<Self>) {
        let weak = Rc::downgrade(self);
        self.outputs.selection().connect_changed(move |selection| {
            with(&weak, |this| this.output_changed(selection));
        });

        let weak = Rc::downgrade(self);
        self.resolution.connect_changed(move |combobox| {
            with(&weak, |this| this.resolution_changed(combobox));
        });

        let weak = Rc::downgrade(self);
        self.refresh_rate.connect_changed(move |combobox| {
            with(&weak, |this| {
                if let Some(value) = combo_box_value(combobox) {
                    this.backend.borrow_mut().set_refresh_rate(value);
                }
            });
        });

        let weak = Rc::downgrade(self);
        self.rotation.connect_changed(move |combobox| {
            with(&weak, |this| {
                if let Some(value) = combo_box_value(combobox) {
                    this.backend.borrow_mut().set_rotation(value);
                }
            });
        });

        let weak = Rc::downgrade(self);
        self.dialog.connect_response(move |_, response| {
            with(&weak, |this| this.response(response));
        });
    }

    fn output_changed(&self, selection: &gtk::TreeSelection) {
        let (model, iter) = match selection.selected() {
            Some(selected) => selected,
            None => return,
        };
        let id = model.value(&iter, COLUMN_OUTPUT_ID as i32).get::<u32>().expect("Failed to get value from TreeModel");
        trace!("Output {} selected", id);

        self.backend.borrow_mut().set_active_output(id as usize);
        self.populate_resolutions();
        self.populate_rotations();
    }

    fn resolution_changed(&self, combobox: &gtk::ComboBox) {
        let value = match combo_box_value(combobox) {
            Some(value) => value,
            None => return,
        };
        self.backend.borrow_mut().set_resolution(value);
        self.populate_refresh_rates();
    }

    fn populate_outputs(&self) {
        let store = gtk::ListStore::new(&[glib::Type::STRING, glib::Type::STRING, glib::Type::U32]);
        self.outputs.set_model(Some(&store));

        let (rows, active) = {
            let backend = self.backend.borrow();
            (backend.outputs(), backend.active_output())
        };
        let selection = self.outputs.selection();
        for row in rows {
            let iter = store.insert_with_values(
                None,
                &[
                    (COLUMN_OUTPUT_NAME, &row.name),
                    (COLUMN_OUTPUT_ICON_NAME, &row.icon_name),
                    (COLUMN_OUTPUT_ID, &(row.id as u32)),
                ],
            );
            if row.id == active {
                selection.select_iter(&iter);
            }
        }
    }

    fn populate_resolutions(&self) {
        let choices = self.backend.borrow().resolutions();
        combo_box_fill(&self.resolution, &choices);
    }

    fn populate_refresh_rates(&self) {
        let selected = combo_box_value(&self.resolution);
        let choices = self.backend.borrow().refresh_rates(selected);
        combo_box_fill(&self.refresh_rate, &choices);
    }

    fn populate_rotations(&self) {
        let choices = self.backend.borrow().rotations();
        combo_box_fill(&self.rotation, &choices);
    }

    fn response(&self, response: gtk::ResponseType) {
        if response == RESPONSE_APPLY {
            let result = self
                .backend
                .borrow_mut()
                .save(&self.scheme, self.store.as_ref());
            if let Err(e) = result {
                error!("{:#}", e);
                show_error(
                    Some(&self.dialog),
                    "Failed to apply the display settings",
                    &format!("{:#}", e),
                    "_Close",
                );
            }
        } else if response == RESPONSE_RELOAD {
            let result = self.backend.borrow_mut().reload();
            match result {
                Ok(()) => self.populate_outputs(),
                Err(e) => {
                    error!("{:#}", e);
                    show_error(
                        Some(&self.dialog),
                        "Failed to reload the display settings",
                        &format!("{:#}", e),
                        "_Close",
                    );
                }
            }
        } else {
            gtk::main_quit();
        }
    }
}

fn with(weak: &Weak<DisplayDialog>, f: impl FnOnce(&DisplayDialog)) {
    if let Some(this) = weak.upgrade() {
        f(&this);
    }
}

/// Runs a modal error message until the user dismisses it.
pub fn show_error(parent: Option<&gtk::Dialog>, primary: &str, secondary: &str, button: &str) {
    let dialog = gtk::MessageDialog::new(
        parent,
        gtk::DialogFlags::MODAL,
        gtk::MessageType::Error,
        gtk::ButtonsType::None,
        primary,
    );
    dialog.set_secondary_text(Some(secondary));
    dialog.add_button(button, gtk::ResponseType::Close);
    dialog.run();
    dialog.close();
}
